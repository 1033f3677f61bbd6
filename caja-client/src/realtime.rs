//! Realtime change feed
//!
//! The backend publishes row changes over a Phoenix-channel websocket. A
//! subscription joins `realtime:<table>` with a `postgres_changes` config,
//! keeps the socket alive with heartbeats and reconnects with exponential
//! backoff. Every (re)connect emits a [`ChangeKind::Resync`] event first, so
//! consumers re-fetch anything they may have missed while disconnected.
//!
//! [`ChangeKind::Resync`]: shared::ChangeKind::Resync

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::message::{ChangeEvent, ChangeKind};
use shared::models::Collection;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::{BackendConfig, ClientResult};

/// Heartbeat interval expected by the realtime service
const HEARTBEAT_INTERVAL_SECS: u64 = 30;
/// Initial reconnect delay
const INITIAL_RECONNECT_DELAY_SECS: u64 = 5;
/// Max reconnect delay
const MAX_RECONNECT_DELAY_SECS: u64 = 120;
/// Events buffered between the socket task and the consumer
const EVENT_BUFFER: usize = 64;

/// Live subscription to one collection's changes
///
/// Dropping the subscription (or calling [`Subscription::close`]) stops the
/// underlying task.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<ChangeEvent>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next change; `None` once the subscription is closed
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    /// Token cancelled when the subscription is closed
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Source of change notifications
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to changes of `collection`
    async fn subscribe(&self, collection: Collection) -> ClientResult<Subscription>;

    /// A feed joining channels on behalf of the user holding `access_token`
    fn authorized(&self, access_token: &str) -> Arc<dyn ChangeFeed>;
}

/// Websocket change feed
#[derive(Debug, Clone)]
pub struct RealtimeFeed {
    config: BackendConfig,
    access_token: Option<String>,
}

impl RealtimeFeed {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            access_token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&self, collection: Collection) -> ClientResult<Subscription> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let worker = FeedWorker {
            url: self.config.realtime_url(),
            schema: self.config.schema.clone(),
            access_token: self.access_token.clone(),
            collection,
            tx,
            cancel: cancel.clone(),
            refs: AtomicU64::new(1),
        };
        tokio::spawn(worker.run());
        Ok(Subscription::new(rx, cancel))
    }

    fn authorized(&self, access_token: &str) -> Arc<dyn ChangeFeed> {
        Arc::new(self.clone().with_token(access_token))
    }
}

/// Why a websocket session ended
enum SessionEnd {
    /// Subscription closed; do not reconnect
    Stopped,
    /// Socket dropped; reconnect after backoff
    Disconnected,
}

struct FeedWorker {
    url: String,
    schema: String,
    access_token: Option<String>,
    collection: Collection,
    tx: mpsc::Sender<ChangeEvent>,
    cancel: CancellationToken,
    refs: AtomicU64,
}

impl FeedWorker {
    fn topic(&self) -> String {
        format!("realtime:{}", self.collection.table())
    }

    fn next_ref(&self) -> String {
        self.refs.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Main run loop: connect, pump events, reconnect on failure
    async fn run(self) {
        tracing::info!(collection = %self.collection, "Change feed started");
        let mut reconnect_delay = Duration::from_secs(INITIAL_RECONNECT_DELAY_SECS);

        loop {
            if self.cancel.is_cancelled() || self.tx.is_closed() {
                break;
            }

            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((ws, _response)) => {
                    reconnect_delay = Duration::from_secs(INITIAL_RECONNECT_DELAY_SECS);
                    if let SessionEnd::Stopped = self.run_session(ws).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        collection = %self.collection,
                        delay_secs = reconnect_delay.as_secs(),
                        "Realtime connection failed: {e}"
                    );
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(reconnect_delay) => {},
            }
            reconnect_delay =
                (reconnect_delay * 2).min(Duration::from_secs(MAX_RECONNECT_DELAY_SECS));
        }

        tracing::info!(collection = %self.collection, "Change feed stopped");
    }

    async fn run_session<S>(&self, ws: S) -> SessionEnd
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut ws_sink, mut ws_stream) = ws.split();
        let topic = self.topic();

        let join = PhoenixMessage::new(
            &topic,
            "phx_join",
            join_payload(&self.schema, self.collection, self.access_token.as_deref()),
            self.next_ref(),
        );
        if ws_sink.send(join.to_ws()).await.is_err() {
            return SessionEnd::Disconnected;
        }
        tracing::debug!(topic = %topic, "Joined realtime channel");

        if self.tx.send(ChangeEvent::resync(self.collection)).await.is_err() {
            return SessionEnd::Stopped;
        }

        let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        heartbeat.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let leave = PhoenixMessage::new(&topic, "phx_leave", json!({}), self.next_ref());
                    let _ = ws_sink.send(leave.to_ws()).await;
                    let _ = ws_sink.close().await;
                    return SessionEnd::Stopped;
                }

                _ = heartbeat.tick() => {
                    let beat = PhoenixMessage::heartbeat(self.next_ref());
                    if ws_sink.send(beat.to_ws()).await.is_err() {
                        tracing::warn!(topic = %topic, "Heartbeat failed, disconnecting");
                        return SessionEnd::Disconnected;
                    }
                }

                incoming = ws_stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match parse_message(text.as_str(), &topic, self.collection) {
                            Incoming::Change(event) => {
                                tracing::debug!(
                                    collection = %self.collection,
                                    kind = %event.kind,
                                    row_id = ?event.row_id,
                                    "Change received"
                                );
                                if self.tx.send(event).await.is_err() {
                                    return SessionEnd::Stopped;
                                }
                            }
                            Incoming::JoinRejected(reason) => {
                                tracing::error!(topic = %topic, reason = %reason, "Channel join rejected");
                                return SessionEnd::Disconnected;
                            }
                            Incoming::ChannelClosed => {
                                tracing::warn!(topic = %topic, "Channel closed by server");
                                return SessionEnd::Disconnected;
                            }
                            Incoming::Ignored => {}
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = ws_sink.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::warn!(topic = %topic, "Realtime socket closed");
                        return SessionEnd::Disconnected;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(topic = %topic, "Realtime socket error: {e}");
                        return SessionEnd::Disconnected;
                    }
                }
            }
        }
    }
}

/// Phoenix channel frame
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhoenixMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

impl PhoenixMessage {
    fn new(topic: &str, event: &str, payload: Value, reference: String) -> Self {
        Self {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            reference: Some(reference),
        }
    }

    fn heartbeat(reference: String) -> Self {
        Self::new("phoenix", "heartbeat", json!({}), reference)
    }

    fn to_ws(&self) -> Message {
        Message::text(serde_json::to_string(self).unwrap_or_default())
    }
}

/// Join payload subscribing to every change of one table
fn join_payload(schema: &str, collection: Collection, access_token: Option<&str>) -> Value {
    let mut payload = json!({
        "config": {
            "broadcast": {"self": false},
            "presence": {"key": ""},
            "postgres_changes": [
                {"event": "*", "schema": schema, "table": collection.table()}
            ]
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = Value::String(token.to_string());
    }
    payload
}

/// Interpretation of one incoming frame
#[derive(Debug, PartialEq)]
enum Incoming {
    Change(ChangeEvent),
    JoinRejected(String),
    ChannelClosed,
    Ignored,
}

fn parse_message(text: &str, topic: &str, collection: Collection) -> Incoming {
    let Ok(msg) = serde_json::from_str::<PhoenixMessage>(text) else {
        tracing::debug!("Unparseable realtime frame ignored");
        return Incoming::Ignored;
    };
    if msg.topic != topic {
        return Incoming::Ignored;
    }

    match msg.event.as_str() {
        "postgres_changes" => change_from(&msg.payload["data"], collection),
        // Legacy channel protocol: the change is the payload itself
        "INSERT" | "UPDATE" | "DELETE" => change_from(&msg.payload, collection),
        "phx_reply" if msg.payload["status"] == "error" => {
            let reason = msg.payload["response"]["reason"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| msg.payload["response"].to_string());
            Incoming::JoinRejected(reason)
        }
        "phx_error" | "phx_close" => Incoming::ChannelClosed,
        _ => Incoming::Ignored,
    }
}

fn change_from(data: &Value, collection: Collection) -> Incoming {
    if let Some(table) = data["table"].as_str()
        && table != collection.table()
    {
        return Incoming::Ignored;
    }
    let Some(kind) = data["type"]
        .as_str()
        .or_else(|| data["eventType"].as_str())
        .and_then(ChangeKind::from_backend)
    else {
        return Incoming::Ignored;
    };

    let present = |v: &Value| match v {
        Value::Object(map) if !map.is_empty() => Some(v.clone()),
        _ => None,
    };
    Incoming::Change(ChangeEvent::with_record(
        collection,
        kind,
        present(&data["record"]),
        present(&data["old_record"]),
    ))
}
