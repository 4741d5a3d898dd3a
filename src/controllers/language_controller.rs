use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::{render::LANG_COOKIE, services::i18n::Language, AppState};

#[derive(Deserialize)]
pub struct LanguageForm {
    pub lang: String,
    #[serde(default)]
    pub next: Option<String>,
}

// only same-site paths; "//host" would leave the app
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(p) if p.starts_with('/') && !p.starts_with("//") => p,
        _ => "/",
    }
}

// POST /language
pub async fn post_language(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LanguageForm>,
) -> impl IntoResponse {
    let lang = Language::from_tag(&form.lang).unwrap_or(state.settings.default_language);

    let mut cookie = Cookie::new(LANG_COOKIE, lang.tag());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);

    let jar = jar.add(cookie);
    (jar, Redirect::to(safe_next(form.next.as_deref())))
}
