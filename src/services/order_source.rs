use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::Settings,
    error::FetchError,
    models::Order,
    services::realtime::{self, Subscription},
};

/// Where orders live. The app only ever reads.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Every order visible to the token's owner, newest `created_at` first.
    async fn list_orders(&self, access_token: &str) -> Result<Vec<Order>, FetchError>;

    /// Resolves once the subscription is live.
    async fn subscribe_to_table_changes(
        &self,
        table: &str,
        access_token: &str,
    ) -> Result<Subscription, FetchError>;
}

/// PostgREST for queries, realtime websocket for change signals.
#[derive(Clone)]
pub struct SupabaseOrderSource {
    http: Client,
    rest_url: String,
    realtime_url: String,
    anon_key: String,
    table: String,
}

impl SupabaseOrderSource {
    pub fn new(settings: &Settings) -> Self {
        let base = settings.supabase_url.trim_end_matches('/');

        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        Self {
            http: Client::new(),
            rest_url: format!("{base}/rest/v1"),
            realtime_url: format!(
                "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
                settings.supabase_anon_key
            ),
            anon_key: settings.supabase_anon_key.clone(),
            table: settings.orders_table.clone(),
        }
    }
}

#[async_trait]
impl OrderSource for SupabaseOrderSource {
    async fn list_orders(&self, access_token: &str) -> Result<Vec<Order>, FetchError> {
        let url = format!("{}/{}", self.rest_url, self.table);
        let res = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        res.json::<Vec<Order>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn subscribe_to_table_changes(
        &self,
        table: &str,
        access_token: &str,
    ) -> Result<Subscription, FetchError> {
        realtime::subscribe(&self.realtime_url, table, access_token).await
    }
}
