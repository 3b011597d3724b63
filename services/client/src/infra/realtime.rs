//! Realtime insert feed over the backend's Phoenix-channel websocket.

use std::time::Duration;

use anyhow::Context as _;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use slotbook_domain::id::{BookingId, VolunteerId};

use crate::config::ClientConfig;
use crate::domain::repository::BookingFeed;
use crate::domain::types::{BookingInserted, BookingSubscription, Session};
use crate::error::ClientError;

const CHANNEL_TOPIC: &str = "realtime:realtime-bookings";
const HEARTBEAT_EVERY: Duration = Duration::from_secs(30);
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct InsertedRecord {
    id: Uuid,
    volunteer_id: Uuid,
}

/// Decode a text frame into an insert event. Anything else (replies,
/// heartbeats, other tables or event types) yields `None`.
pub fn parse_insert(text: &str) -> Option<BookingInserted> {
    let frame: Frame = serde_json::from_str(text).ok()?;
    if frame.topic != CHANNEL_TOPIC || frame.event != "postgres_changes" {
        return None;
    }
    let data = frame.payload.get("data")?;
    let is_insert = data.get("type").and_then(Value::as_str) == Some("INSERT");
    let is_bookings = data
        .get("table")
        .and_then(Value::as_str)
        .is_none_or(|t| t == "bookings");
    if !is_insert || !is_bookings {
        return None;
    }
    let record: InsertedRecord = serde_json::from_value(data.get("record")?.clone()).ok()?;
    Some(BookingInserted {
        booking_id: BookingId(record.id),
        volunteer_id: VolunteerId(record.volunteer_id),
    })
}

fn join_frame(access_token: &str) -> String {
    json!({
        "topic": CHANNEL_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": "bookings" }
                ]
            },
            "access_token": access_token
        },
        "ref": "1",
        "join_ref": "1"
    })
    .to_string()
}

fn heartbeat_frame(seq: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": seq.to_string()
    })
    .to_string()
}

/// Websocket URL for a project base URL.
pub fn socket_url(base_url: &str, anon_key: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_owned()
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={anon_key}&vsn=1.0.0")
}

pub struct RealtimeBookingFeed {
    url: String,
    anon_key: String,
    session: watch::Receiver<Session>,
}

impl RealtimeBookingFeed {
    pub fn new(config: &ClientConfig, session: watch::Receiver<Session>) -> Self {
        Self {
            url: socket_url(&config.supabase_url, &config.anon_key),
            anon_key: config.anon_key.clone(),
            session,
        }
    }
}

impl BookingFeed for RealtimeBookingFeed {
    async fn subscribe_inserts(&self) -> Result<BookingSubscription, ClientError> {
        let token = self
            .session
            .borrow()
            .access_token()
            .map(str::to_owned)
            .unwrap_or_else(|| self.anon_key.clone());
        let (socket, _) = connect_async(self.url.as_str())
            .await
            .context("connect realtime socket")?;
        let (mut sink, mut stream) = socket.split();
        sink.send(Message::Text(join_frame(&token).into()))
            .await
            .context("join realtime channel")?;
        info!(topic = CHANNEL_TOPIC, "subscribed to booking inserts");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_EVERY);
            heartbeat.tick().await;
            let mut seq = 1u64;
            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        seq += 1;
                        if let Err(e) = sink.send(Message::Text(heartbeat_frame(seq).into())).await {
                            warn!(error = %e, "realtime heartbeat failed");
                            return;
                        }
                    }
                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = parse_insert(text.as_str()) {
                                debug!(booking_id = %event.booking_id, "booking inserted");
                                if tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("realtime socket closed");
                            return;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "realtime socket error");
                            return;
                        }
                    },
                }
            }
        });
        Ok(BookingSubscription::new(rx, Some(task)))
    }
}
