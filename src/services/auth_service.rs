use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{config::Settings, error::AuthError, AppState};

/// A successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub expires_in: i64,
    pub user_id: String,
    pub email: String,
}

/// Managed authentication backend. The app never checks passwords itself.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// GoTrue-compatible auth service (the one behind Supabase projects).
#[derive(Clone)]
pub struct GoTrueGateway {
    http: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

// GoTrue has shipped several error shapes over time.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

impl GoTrueGateway {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("{}/auth/v1", settings.supabase_url.trim_end_matches('/')),
            anon_key: settings.supabase_anon_key.clone(),
        }
    }
}

#[async_trait]
impl AuthGateway for GoTrueGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/token", self.base_url);
        let res = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            let body = res
                .json::<TokenResponse>()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;

            return Ok(Session {
                access_token: body.access_token,
                expires_in: body.expires_in,
                email: body.user.email.unwrap_or_else(|| email.to_string()),
                user_id: body.user.id,
            });
        }

        let text = res.text().await.unwrap_or_default();
        if status.is_client_error() {
            let msg = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| "Invalid login credentials".to_string());
            return Err(AuthError::Rejected(msg));
        }

        Err(AuthError::Unexpected {
            status: status.as_u16(),
            body: text,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/logout", self.base_url);
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = res.status();
        // an expired token is already signed out as far as we care
        if status.is_success() || status.as_u16() == 401 {
            return Ok(());
        }

        Err(AuthError::Unexpected {
            status: status.as_u16(),
            body: res.text().await.unwrap_or_default(),
        })
    }
}

// No max-age: the token's own `exp` bounds the session.
pub fn auth_cookie(state: &AppState, session: &Session) -> Cookie<'static> {
    let mut cookie = Cookie::new(
        state.settings.auth_cookie_name.clone(),
        session.access_token.clone(),
    );
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if state.settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}

pub fn clear_auth_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.auth_cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}
