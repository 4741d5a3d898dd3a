use std::env;

use crate::services::i18n::Language;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    // managed backend (auth + rest + realtime)
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,

    pub auth_cookie_name: String,
    pub cookie_secure: bool,

    pub default_language: Language,
    pub orders_table: String,
    pub orders_fetch_timeout_secs: u64,

    // used for history grouping until the browser reports its own offset
    pub default_utc_offset_minutes: i32,
}

impl Settings {
    /// Settings suitable for tests and local development without a backend.
    pub fn local() -> Self {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: "super-secret-jwt-token-with-at-least-32-characters-long".to_string(),
            auth_cookie_name: "sb-access-token".to_string(),
            cookie_secure: false,
            default_language: Language::Es,
            orders_table: "orders".to_string(),
            orders_fetch_timeout_secs: 10,
            default_utc_offset_minutes: 0,
        }
    }
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let defaults = Settings::local();

    let host = env::var("HOST").unwrap_or(defaults.host);

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let supabase_url = env::var("SUPABASE_URL")
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or(defaults.supabase_url);
    let supabase_anon_key = env::var("SUPABASE_ANON_KEY").unwrap_or(defaults.supabase_anon_key);
    let supabase_jwt_secret =
        env::var("SUPABASE_JWT_SECRET").unwrap_or(defaults.supabase_jwt_secret);

    let auth_cookie_name = env::var("AUTH_COOKIE_NAME").unwrap_or(defaults.auth_cookie_name);
    let cookie_secure = env::var("COOKIE_SECURE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(defaults.cookie_secure);

    let default_language = env::var("DEFAULT_LANGUAGE")
        .ok()
        .and_then(|tag| Language::from_tag(&tag))
        .unwrap_or(defaults.default_language);

    let orders_table = env::var("ORDERS_TABLE").unwrap_or(defaults.orders_table);
    let orders_fetch_timeout_secs = env::var("ORDERS_FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(defaults.orders_fetch_timeout_secs);

    let default_utc_offset_minutes = env::var("DEFAULT_UTC_OFFSET_MINUTES")
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(defaults.default_utc_offset_minutes);

    Settings {
        host,
        port,
        supabase_url,
        supabase_anon_key,
        supabase_jwt_secret,
        auth_cookie_name,
        cookie_secure,
        default_language,
        orders_table,
        orders_fetch_timeout_secs,
        default_utc_offset_minutes,
    }
}
