use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::is_htmx,
    error::AuthError,
    models::CurrentUser,
    render,
    services::{auth_service, i18n::Language},
    AppState,
};

fn htmx_redirect(path: &'static str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("HX-Redirect", axum::http::HeaderValue::from_static(path));
    (StatusCode::OK, headers, Html("".to_string())).into_response()
}

fn see_other(path: &'static str) -> (StatusCode, [(&'static str, &'static str); 1], Html<String>) {
    (StatusCode::SEE_OTHER, [("Location", path)], Html("".to_string()))
}

fn is_valid_email(email: &str) -> bool {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    re.is_match(email)
}

fn render_login(state: &AppState, headers: &HeaderMap, lang: Language, extra: Value) -> Response {
    let ctx = render::page_ctx(lang, None, "/login", extra);

    let body = match state.hbs.render("pages/login", &ctx) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("template error: {e}")),
            )
                .into_response()
        }
    };

    if is_htmx(headers) {
        return (StatusCode::OK, Html(body)).into_response();
    }

    match render::render_full(state, lang, &lang.translate("login"), body, None, "/login") {
        Ok(page) => (StatusCode::OK, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}

// ---------------- LOGIN ----------------

pub async fn get_login(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let lang = render::viewer_language(&state, &headers);
    render_login(&state, &headers, lang, json!({}))
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn post_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let lang = render::viewer_language(&state, &headers);
    let email = form.email.trim().to_string();
    let password = form.password;

    let mut errors = serde_json::Map::new();

    if email.is_empty() {
        errors.insert("email".into(), json!("Email is required."));
    } else if !is_valid_email(&email) {
        errors.insert("email".into(), json!("Invalid email."));
    }

    if password.is_empty() {
        errors.insert("password".into(), json!("Password is required."));
    }

    if !errors.is_empty() {
        return render_login(
            &state,
            &headers,
            lang,
            json!({ "values": { "email": email }, "errors": errors }),
        );
    }

    let session = match state.auth.sign_in(&email, &password).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("sign-in rejected for {}: {}", email, e);

            let description = match e {
                AuthError::Rejected(msg) => msg,
                AuthError::Transport(_) | AuthError::Unexpected { .. } => {
                    "Server error. Please try again.".to_string()
                }
            };

            return render_login(
                &state,
                &headers,
                lang,
                json!({
                    "values": { "email": email },
                    "toast": { "title": lang.translate("error"), "description": description },
                }),
            );
        }
    };

    tracing::info!(
        "signed in: {} (user {}, token valid for {}s)",
        session.email,
        session.user_id,
        session.expires_in
    );

    let jar = jar.add(auth_service::auth_cookie(&state, &session));

    if is_htmx(&headers) {
        return (jar, htmx_redirect("/dashboard")).into_response();
    }

    (jar, see_other("/dashboard")).into_response()
}

// ---------------- LOGOUT ----------------

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    if let Some(Extension(u)) = user {
        if let Err(e) = state.auth.sign_out(&u.access_token).await {
            tracing::warn!("sign-out failed for {}: {}", u.email, e);
        }
    }

    let jar = jar.add(auth_service::clear_auth_cookie(&state));
    (jar, see_other("/login"))
}
