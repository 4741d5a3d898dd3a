#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use orderboard::{
    config::Settings,
    error::{AuthError, FetchError},
    models::Order,
    services::{
        auth_service::{AuthGateway, Session},
        order_source::OrderSource,
        realtime::{ChangeSignal, Subscription},
    },
    templates, AppState,
};
use serde_json::json;
use tokio::sync::mpsc;

pub const GOOD_PASSWORD: &str = "hunter22";

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn order(id: i64, status: &str, created_at: DateTime<Utc>) -> Order {
    Order {
        id,
        table_no: format!("T{id}"),
        status: status.to_string(),
        created_at,
        notes: None,
    }
}

pub fn mint_token(settings: &Settings, user_id: &str, email: &str) -> String {
    let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    encode(
        &Header::default(),
        &json!({ "sub": user_id, "email": email, "exp": exp, "aud": "authenticated" }),
        &EncodingKey::from_secret(settings.supabase_jwt_secret.as_bytes()),
    )
    .unwrap()
}

/// Auth service that accepts a single password.
pub struct FakeAuth {
    settings: Settings,
    pub sign_outs: AtomicUsize,
    pub unreachable: AtomicBool,
}

impl FakeAuth {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            sign_outs: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AuthGateway for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("connection refused".to_string()));
        }
        if password != GOOD_PASSWORD {
            return Err(AuthError::Rejected("Invalid login credentials".to_string()));
        }
        Ok(Session {
            access_token: mint_token(&self.settings, "user-1", email),
            expires_in: 3600,
            user_id: "user-1".to_string(),
            email: email.to_string(),
        })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory orders table with a hand-cranked change feed.
#[derive(Default)]
pub struct FakeOrders {
    orders: Mutex<Vec<Order>>,
    failing: AtomicBool,
    list_calls: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::Sender<ChangeSignal>>>,
    log: Mutex<Vec<&'static str>>,
}

impl FakeOrders {
    pub fn with_orders(orders: Vec<Order>) -> Arc<Self> {
        let fake = Self::default();
        *fake.orders.lock().unwrap() = orders;
        Arc::new(fake)
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock().unwrap() = orders;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// "subscribe" / "list" in call order.
    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    /// One table change, delivered to every live subscription.
    pub async fn signal(&self) {
        let subs: Vec<_> = self.subscribers.lock().unwrap().clone();
        for tx in subs {
            let _ = tx.send(ChangeSignal).await;
        }
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// Ends the feed as if the upstream connection dropped.
    pub fn close_feeds(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

#[async_trait]
impl OrderSource for FakeOrders {
    async fn list_orders(&self, _access_token: &str) -> Result<Vec<Order>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push("list");
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut orders = self.orders.lock().unwrap().clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn subscribe_to_table_changes(
        &self,
        _table: &str,
        _access_token: &str,
    ) -> Result<Subscription, FetchError> {
        self.log.lock().unwrap().push("subscribe");
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().unwrap().push(tx);
        Ok(Subscription::from_channel(rx))
    }
}

pub fn test_state_with(orders: Arc<FakeOrders>) -> (AppState, Arc<FakeAuth>) {
    let settings = Settings::local();
    let auth = Arc::new(FakeAuth::new(&settings));

    let state = AppState {
        hbs: templates::build_handlebars(),
        settings,
        auth: auth.clone(),
        orders,
    };
    (state, auth)
}

pub fn test_state() -> AppState {
    test_state_with(FakeOrders::with_orders(vec![])).0
}

pub fn auth_cookie_header(state: &AppState) -> String {
    let token = mint_token(&state.settings, "user-1", "chef@example.com");
    format!("{}={}", state.settings.auth_cookie_name, token)
}

pub async fn response_body_string(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Polls `cond` for up to a second.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
