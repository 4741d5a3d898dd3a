use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{models::CurrentUser, AppState};

/// Claims we rely on from the auth service's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id (uuid)
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Malformed or valueless pairs in the header are skipped, not fatal.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|c| c.value().to_string())
}

pub fn verify_token(token: &str, secret: &str) -> Option<CurrentUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_audience(&[TOKEN_AUDIENCE]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    Some(CurrentUser {
        id: data.claims.sub,
        email: data.claims.email.unwrap_or_default(),
        access_token: token.to_string(),
    })
}

/// Decides "signed in or not" for this request only; nothing is cached.
pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie_name = state.settings.auth_cookie_name.as_str();

    if let Some(token) = get_cookie(req.headers(), cookie_name) {
        match verify_token(&token, &state.settings.supabase_jwt_secret) {
            Some(user) => {
                req.extensions_mut().insert(user);
            }
            None => tracing::debug!("ignoring invalid or expired session cookie"),
        }
    }

    next.run(req).await
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

fn is_public_path(path: &str) -> bool {
    path == "/"
        || path == "/login"
        || path == "/logout"
        || path == "/language"
        || path == "/health"
        || path == "/favicon.ico"
        || path.starts_with("/static/")
}

pub async fn require_auth(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if is_public_path(path) {
        return next.run(req).await;
    }

    // inject_current_user already put CurrentUser in extensions => authenticated
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    // Not logged in:
    // - event stream: 401 (EventSource can't follow a login redirect)
    // - HTMX: force full redirect to /login
    // - Normal: redirect to /login
    if is_event_stream(req.headers()) || path.starts_with("/events/") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if is_htmx(req.headers()) {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Redirect", HeaderValue::from_static("/login"));
        return (StatusCode::OK, headers, Html("".to_string())).into_response();
    }

    Redirect::to("/login").into_response()
}
