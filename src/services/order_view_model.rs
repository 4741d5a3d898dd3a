//! Client-side projection of the orders table for one mounted page.
//!
//! The view model owns a snapshot that is only ever replaced whole. Every
//! refresh is tagged with a sequence number and a response is applied only
//! when it is newer than the snapshot already held, so overlapping refreshes
//! settle on the most recent request regardless of arrival order.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock, Weak,
    },
    time::Duration,
};

use tokio::{sync::oneshot, task::JoinHandle, time::timeout};

use crate::{
    error::FetchError,
    models::{CurrentUser, Order},
    services::order_source::OrderSource,
    AppState,
};

const STOP_GRACE: Duration = Duration::from_secs(3);

pub type Snapshot = Arc<[Order]>;

struct Held {
    seq: u64,
    orders: Snapshot,
}

pub struct OrderViewModel {
    source: Arc<dyn OrderSource>,
    access_token: String,
    table: String,
    fetch_timeout: Duration,
    issued: AtomicU64,
    held: RwLock<Held>,
}

impl OrderViewModel {
    pub fn new(
        source: Arc<dyn OrderSource>,
        access_token: impl Into<String>,
        table: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            access_token: access_token.into(),
            table: table.into(),
            fetch_timeout,
            issued: AtomicU64::new(0),
            held: RwLock::new(Held {
                seq: 0,
                orders: Arc::from(Vec::new()),
            }),
        }
    }

    pub fn for_user(state: &AppState, user: &CurrentUser) -> Self {
        Self::new(
            Arc::clone(&state.orders),
            user.access_token.clone(),
            state.settings.orders_table.clone(),
            Duration::from_secs(state.settings.orders_fetch_timeout_secs),
        )
    }

    /// The snapshot held right now (empty before the first successful fetch).
    pub fn orders(&self) -> Snapshot {
        let held = self.held.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&held.orders)
    }

    /// Re-reads every order and swaps the snapshot in.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// returned. On success the returned snapshot is whatever is held after
    /// this call, which may be a newer one if a later refresh won the race.
    pub async fn refresh(&self) -> Result<Snapshot, FetchError> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = match timeout(self.fetch_timeout, self.source.list_orders(&self.access_token)).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        let orders = match fetched {
            Ok(orders) => orders,
            Err(e) => {
                tracing::warn!("order refresh #{} failed, keeping previous snapshot: {}", seq, e);
                return Err(e);
            }
        };

        let mut held = self.held.write().unwrap_or_else(PoisonError::into_inner);
        if seq > held.seq {
            held.seq = seq;
            held.orders = Arc::from(orders);
        } else {
            tracing::debug!("discarding stale order response #{} (holding #{})", seq, held.seq);
        }

        Ok(Arc::clone(&held.orders))
    }

    /// Refreshes once per change signal and hands each outcome to `on_change`.
    ///
    /// The subscription is live when this returns. It lasts until the
    /// returned handle is unsubscribed or dropped, or the view model itself
    /// is dropped.
    pub async fn subscribe_to_changes<F>(
        self: &Arc<Self>,
        mut on_change: F,
    ) -> Result<ChangeHandle, FetchError>
    where
        F: FnMut(Result<Snapshot, FetchError>) + Send + 'static,
    {
        let mut subscription = self
            .source
            .subscribe_to_table_changes(&self.table, &self.access_token)
            .await?;

        let view: Weak<Self> = Arc::downgrade(self);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop_rx => break,

                    signal = subscription.next_signal() => {
                        if signal.is_none() {
                            tracing::info!("order change feed ended");
                            break;
                        }
                        let Some(view) = view.upgrade() else { break };
                        on_change(view.refresh().await);
                    }
                }
            }

            subscription.unsubscribe().await;
        });

        Ok(ChangeHandle {
            stop: Some(stop_tx),
            task: Some(task),
        })
    }

    /// Subscribe first, then fetch, so nothing that changes in between is lost.
    pub async fn mount<F>(self, on_change: F) -> Result<MountedOrders, FetchError>
    where
        F: FnMut(Result<Snapshot, FetchError>) + Send + 'static,
    {
        let view = Arc::new(self);
        let changes = view.subscribe_to_changes(on_change).await?;
        let initial = view.refresh().await;

        Ok(MountedOrders {
            view,
            changes,
            initial,
        })
    }
}

/// A view model with a live change subscription.
pub struct MountedOrders {
    pub view: Arc<OrderViewModel>,
    pub changes: ChangeHandle,
    pub initial: Result<Snapshot, FetchError>,
}

/// Deregistration handle for [`OrderViewModel::subscribe_to_changes`].
///
/// Dropping it tears the subscription down immediately.
pub struct ChangeHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChangeHandle {
    pub async fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Some(mut task) = self.task.take() {
            if timeout(STOP_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
    }
}

impl Drop for ChangeHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
