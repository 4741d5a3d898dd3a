use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect},
};
use serde_json::json;

use crate::{auth::is_htmx, models::CurrentUser, render, AppState};

// GET /  -> straight to the dashboard when signed in
pub async fn home(user: Option<Extension<CurrentUser>>) -> Redirect {
    match user {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

pub async fn not_found(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    let lang = render::viewer_language(&state, &headers);
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let ctx = render::page_ctx(lang, user_ref, uri.path(), json!({}));

    let body = match state.hbs.render("pages/not_found", &ctx) {
        Ok(s) => s,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("template error: {e}")))
                .into_response()
        }
    };

    if is_htmx(&headers) {
        return (StatusCode::NOT_FOUND, Html(body)).into_response();
    }

    match render::render_full(&state, lang, "404", body, user_ref, uri.path()) {
        Ok(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}
