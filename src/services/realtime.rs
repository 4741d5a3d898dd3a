//! Table change subscriptions over the realtime websocket.
//!
//! The channel speaks the Phoenix protocol: one `phx_join` carrying a
//! `postgres_changes` filter, a heartbeat on the `phoenix` topic, and one
//! `postgres_changes` frame per row change. Frames are reduced to a bare
//! [`ChangeSignal`]; callers re-read the table instead of applying diffs.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{interval, timeout},
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TMessage};

use crate::error::FetchError;

const HEARTBEAT_EVERY: Duration = Duration::from_secs(25);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const LEAVE_GRACE: Duration = Duration::from_secs(2);
const SIGNAL_BUFFER: usize = 64;
const JOIN_REF: &str = "1";

/// "Something in the table changed." Carries nothing on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// A live change subscription.
///
/// Signals arrive through [`Subscription::next_signal`]. Dropping the
/// subscription aborts the background connection; [`Subscription::unsubscribe`]
/// leaves the channel politely first.
pub struct Subscription {
    signals: mpsc::Receiver<ChangeSignal>,
    leave: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps a plain signal channel (no connection behind it).
    pub fn from_channel(signals: mpsc::Receiver<ChangeSignal>) -> Self {
        Self {
            signals,
            leave: None,
            task: None,
        }
    }

    fn with_connection(
        signals: mpsc::Receiver<ChangeSignal>,
        leave: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            signals,
            leave: Some(leave),
            task: Some(task),
        }
    }

    /// Next change signal, or `None` once the upstream channel is gone.
    pub async fn next_signal(&mut self) -> Option<ChangeSignal> {
        self.signals.recv().await
    }

    pub async fn unsubscribe(mut self) {
        self.signals.close();

        if let Some(leave) = self.leave.take() {
            let _ = leave.send(());
        }

        if let Some(mut task) = self.task.take() {
            if timeout(LEAVE_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PhxMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Frame {
    JoinOk,
    JoinFailed(String),
    Change(String),
    Closed,
    Other,
}

fn classify(topic: &str, text: &str) -> Frame {
    let Ok(msg) = serde_json::from_str::<PhxMessage>(text) else {
        return Frame::Other;
    };

    if msg.topic != topic {
        return Frame::Other;
    }

    match msg.event.as_str() {
        "phx_reply" if msg.reference.as_deref() == Some(JOIN_REF) => {
            let status = msg.payload.get("status").and_then(|s| s.as_str());
            if status == Some("ok") {
                Frame::JoinOk
            } else {
                let reason = msg
                    .payload
                    .pointer("/response/reason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("join rejected")
                    .to_string();
                Frame::JoinFailed(reason)
            }
        }
        "postgres_changes" => {
            let kind = msg
                .payload
                .pointer("/data/type")
                .and_then(|t| t.as_str())
                .unwrap_or("*")
                .to_string();
            Frame::Change(kind)
        }
        // legacy per-event frames
        "INSERT" | "UPDATE" | "DELETE" => Frame::Change(msg.event),
        "phx_close" | "phx_error" => Frame::Closed,
        _ => Frame::Other,
    }
}

fn frame(topic: &str, event: &str, payload: serde_json::Value, reference: &str) -> TMessage {
    let msg = PhxMessage {
        topic: topic.to_string(),
        event: event.to_string(),
        payload,
        reference: Some(reference.to_string()),
    };
    TMessage::Text(serde_json::to_string(&msg).unwrap_or_default())
}

/// Opens a realtime channel on `table` and waits for the join to be
/// acknowledged, so no change after this returns can be missed.
pub async fn subscribe(
    ws_url: &str,
    table: &str,
    access_token: &str,
) -> Result<Subscription, FetchError> {
    let topic = format!("realtime:{table}-changes");

    let (socket, _) = timeout(JOIN_TIMEOUT, connect_async(ws_url))
        .await
        .map_err(|_| FetchError::Subscribe("realtime connect timed out".to_string()))?
        .map_err(|e| FetchError::Subscribe(e.to_string()))?;

    let (mut write, mut read) = socket.split();

    let join = json!({
        "config": {
            "postgres_changes": [
                { "event": "*", "schema": "public", "table": table }
            ]
        },
        "access_token": access_token,
    });
    write
        .send(frame(&topic, "phx_join", join, JOIN_REF))
        .await
        .map_err(|e| FetchError::Subscribe(e.to_string()))?;

    let joined = timeout(JOIN_TIMEOUT, async {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(TMessage::Text(txt)) => match classify(&topic, &txt) {
                    Frame::JoinOk => return Ok(()),
                    Frame::JoinFailed(reason) => return Err(FetchError::Subscribe(reason)),
                    Frame::Closed => {
                        return Err(FetchError::Subscribe("channel closed during join".into()));
                    }
                    _ => {}
                },
                Ok(TMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(FetchError::Subscribe(e.to_string())),
            }
        }
        Err(FetchError::Subscribe("connection closed during join".to_string()))
    })
    .await
    .map_err(|_| FetchError::Subscribe("realtime join timed out".to_string()))?;
    joined?;

    tracing::info!("realtime channel joined: {}", topic);

    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER);
    let (leave_tx, mut leave_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut heartbeat = interval(HEARTBEAT_EVERY);
        heartbeat.tick().await;
        let mut next_ref: u64 = 2;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    let hb = frame("phoenix", "heartbeat", json!({}), &next_ref.to_string());
                    next_ref += 1;
                    if write.send(hb).await.is_err() {
                        break;
                    }
                }

                _ = &mut leave_rx => {
                    let leave = frame(&topic, "phx_leave", json!({}), &next_ref.to_string());
                    let _ = write.send(leave).await;
                    let _ = write.close().await;
                    break;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(TMessage::Text(txt))) => match classify(&topic, &txt) {
                            Frame::Change(kind) => {
                                tracing::debug!("change signal on {}: {}", topic, kind);
                                if signal_tx.send(ChangeSignal).await.is_err() {
                                    break;
                                }
                            }
                            Frame::Closed => break,
                            _ => {}
                        },
                        Some(Ok(TMessage::Ping(payload))) => {
                            let _ = write.send(TMessage::Pong(payload)).await;
                        }
                        Some(Ok(TMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("realtime channel {} failed: {}", topic, e);
                            break;
                        }
                    }
                }

                _ = signal_tx.closed() => {
                    let leave = frame(&topic, "phx_leave", json!({}), &next_ref.to_string());
                    let _ = write.send(leave).await;
                    let _ = write.close().await;
                    break;
                }
            }
        }

        tracing::info!("realtime channel left: {}", topic);
    });

    Ok(Subscription::with_connection(signal_rx, leave_tx, task))
}
