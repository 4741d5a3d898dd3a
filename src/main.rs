use std::{net::SocketAddr, sync::Arc};

use orderboard::{
    config, routes,
    services::{auth_service::GoTrueGateway, order_source::SupabaseOrderSource},
    templates, AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderboard=info,OrderBoard=info".into()),
        )
        .init();

    let settings = config::load();

    if settings.supabase_anon_key.trim().is_empty() {
        tracing::warn!("SUPABASE_ANON_KEY is empty; sign-in and order queries will be rejected");
    }

    let state = AppState {
        hbs: templates::build_handlebars(),
        settings: settings.clone(),
        auth: Arc::new(GoTrueGateway::new(&settings)),
        orders: Arc::new(SupabaseOrderSource::new(&settings)),
    };

    let app = routes::app(state);

    let ip = match settings.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("invalid HOST {}: {}", settings.host, e);
            return;
        }
    };
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
