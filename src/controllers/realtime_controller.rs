use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use chrono::FixedOffset;
use tokio::sync::watch;

use crate::{
    models::CurrentUser,
    render,
    services::{
        i18n::Language,
        order_view_model::{MountedOrders, OrderViewModel},
    },
    AppState,
};

/// Everything one open dashboard owns. Dropping it (browser went away)
/// drops the change subscription with it.
struct LiveDashboard {
    state: AppState,
    lang: Language,
    offset: FixedOffset,
    mounted: MountedOrders,
    // true while the last refresh failed
    stale: watch::Receiver<bool>,
    initial: Option<bool>,
}

impl LiveDashboard {
    fn render(&self, stale: bool) -> Event {
        let orders = self.mounted.view.orders();
        let html = render::render_order_tabs(&self.state, &orders, self.lang, self.offset, stale)
            .unwrap_or_else(|e| format!("template error: {e}"));

        // SSE data lines can't carry carriage returns
        Event::default().event("orders").data(html.replace('\r', ""))
    }
}

// GET /events/orders  (SSE)
pub async fn sse_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let lang = render::viewer_language(&state, &headers);
    let offset = render::viewer_offset(&state, &headers);

    let (stale_tx, stale_rx) = watch::channel(false);

    let view = OrderViewModel::for_user(&state, &user);
    let mounted = match view
        .mount(move |outcome| {
            stale_tx.send_replace(outcome.is_err());
        })
        .await
    {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("live orders unavailable for {}: {}", user.email, e);
            return (StatusCode::SERVICE_UNAVAILABLE, "live updates unavailable").into_response();
        }
    };

    tracing::info!("live dashboard mounted for {}", user.email);

    let initial = Some(mounted.initial.is_err());
    let live = LiveDashboard {
        state,
        lang,
        offset,
        mounted,
        stale: stale_rx,
        initial,
    };

    let stream = futures_util::stream::unfold(live, |mut live| async move {
        let stale = match live.initial.take() {
            Some(stale) => stale,
            None => {
                // sender gone => change feed ended
                if live.stale.changed().await.is_err() {
                    return None;
                }
                *live.stale.borrow_and_update()
            }
        };

        let evt = live.render(stale);
        Some((Ok::<Event, Infallible>(evt), live))
    });

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(20))
                .text("keep-alive"),
        )
        .into_response()
}
