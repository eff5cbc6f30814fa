//! Owned event connection
//!
//! A [`Connection`] owns one [`EventTransport`] and the handlers registered
//! on it. Whoever opens it passes it to the components that need it and
//! closes it when done; there is no shared global handle.

use crate::cancel::CancellationToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// One event pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Event name
    pub name: String,
    /// Event payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ServerEvent {
    /// Create event
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Settings handed to the transport when connecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Socket path on the API host
    pub path: String,
    /// Document the connection reports on
    pub document_id: Option<String>,
    /// Reconnection attempts before giving up
    pub reconnection_attempts: u32,
    /// Delay between reconnection attempts
    #[serde(with = "duration_millis")]
    pub reconnection_delay: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            path: "/ws".to_string(),
            document_id: None,
            reconnection_attempts: 5,
            reconnection_delay: Duration::from_secs(1),
        }
    }
}

impl ConnectionOptions {
    /// Options for one document
    #[inline]
    #[must_use]
    pub fn for_document(document_id: impl Into<String>) -> Self {
        Self {
            document_id: Some(document_id.into()),
            ..Self::default()
        }
    }

    /// With socket path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// With reconnection policy
    #[inline]
    #[must_use]
    pub fn with_reconnection(mut self, attempts: u32, delay: Duration) -> Self {
        self.reconnection_attempts = attempts;
        self.reconnection_delay = delay;
        self
    }

    /// Query parameters for the connect request
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        self.document_id
            .iter()
            .map(|id| ("documentId", id.clone()))
            .collect()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Event stream to and from the server
#[async_trait]
pub trait EventTransport: Send {
    /// Next event, or `None` once the transport has ended
    async fn next_event(&mut self) -> Option<ServerEvent>;

    /// Close the transport
    async fn close(&mut self);
}

type Handler = Box<dyn FnMut(&serde_json::Value) + Send>;

/// An open connection and its handlers
pub struct Connection<T: EventTransport> {
    transport: T,
    options: ConnectionOptions,
    handlers: HashMap<String, Vec<Handler>>,
    dispatched: u64,
}

impl<T: EventTransport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("events", &self.handlers.keys().collect::<Vec<_>>())
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}

impl<T: EventTransport> Connection<T> {
    /// Take ownership of a connected transport
    pub fn open(transport: T, options: ConnectionOptions) -> Self {
        tracing::info!(
            path = %options.path,
            document_id = options.document_id.as_deref().unwrap_or("-"),
            "connection opened"
        );
        Self {
            transport,
            options,
            handlers: HashMap::new(),
            dispatched: 0,
        }
    }

    /// Options the connection was opened with
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Events dispatched so far
    #[inline]
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Register a handler for an event name
    pub fn on<F>(&mut self, event: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&serde_json::Value) + Send + 'static,
    {
        self.handlers
            .entry(event.into())
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Wait for one event and run its handlers
    ///
    /// Returns the number of handlers run, or `None` once the transport has
    /// ended.
    pub async fn dispatch_next(&mut self) -> Option<usize> {
        let event = self.transport.next_event().await?;
        Some(self.dispatch(&event))
    }

    fn dispatch(&mut self, event: &ServerEvent) -> usize {
        self.dispatched += 1;
        match self.handlers.get_mut(&event.name) {
            Some(handlers) => {
                for handler in handlers.iter_mut() {
                    handler(&event.payload);
                }
                handlers.len()
            }
            None => {
                tracing::debug!(event = %event.name, "no handler for event");
                0
            }
        }
    }

    /// Dispatch events until the transport ends or `token` fires
    pub async fn run(&mut self, token: &CancellationToken) -> u64 {
        let start = self.dispatched;
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                event = self.transport.next_event() => match event {
                    Some(event) if !token.is_cancelled() => {
                        self.dispatch(&event);
                    }
                    _ => break,
                },
            }
        }
        self.dispatched - start
    }

    /// Close the transport and drop the handlers
    pub async fn close(mut self) {
        self.transport.close().await;
        tracing::info!(dispatched = self.dispatched, "connection closed");
    }
}

/// In-process transport backed by a channel
#[derive(Debug)]
pub struct ChannelTransport {
    rx: mpsc::Receiver<ServerEvent>,
}

impl ChannelTransport {
    /// Create a sender and the transport reading from it
    #[must_use]
    pub fn pair(capacity: usize) -> (mpsc::Sender<ServerEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventTransport for ChannelTransport {
    async fn next_event(&mut self) -> Option<ServerEvent> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_default_options() {
        let options = ConnectionOptions::for_document("doc-7");
        assert_eq!(options.path, "/ws");
        assert_eq!(options.reconnection_attempts, 5);
        assert_eq!(options.reconnection_delay, Duration::from_millis(1000));
        assert_eq!(options.query(), vec![("documentId", "doc-7".to_string())]);
        assert!(ConnectionOptions::default().query().is_empty());
    }

    #[test]
    fn test_options_json_uses_millis() {
        let json = serde_json::to_value(ConnectionOptions::default()).unwrap();
        assert_eq!(json["reconnection_delay"], 1000);
    }

    #[tokio::test]
    async fn test_dispatch_by_event_name() {
        let (tx, transport) = ChannelTransport::pair(8);
        let mut conn = Connection::open(transport, ConnectionOptions::default());
        let progress = Arc::new(Mutex::new(Vec::new()));

        let sink = progress.clone();
        conn.on("progress", move |payload| {
            sink.lock().push(payload["value"].as_u64().unwrap_or(0));
        });

        tx.send(ServerEvent::new("progress", json!({"value": 40}))).await.unwrap();
        tx.send(ServerEvent::new("unrelated", json!(null))).await.unwrap();
        tx.send(ServerEvent::new("progress", json!({"value": 90}))).await.unwrap();
        drop(tx);

        assert_eq!(conn.dispatch_next().await, Some(1));
        assert_eq!(conn.dispatch_next().await, Some(0));
        assert_eq!(conn.dispatch_next().await, Some(1));
        assert_eq!(conn.dispatch_next().await, None);
        assert_eq!(*progress.lock(), vec![40, 90]);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_run_until_transport_ends() {
        let (tx, transport) = ChannelTransport::pair(8);
        let mut conn = Connection::open(transport, ConnectionOptions::default());
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        conn.on("done", move |_| *sink.lock() += 1);

        for _ in 0..3 {
            tx.send(ServerEvent::new("done", json!({}))).await.unwrap();
        }
        drop(tx);

        assert_eq!(conn.run(&CancellationToken::new()).await, 3);
        assert_eq!(*count.lock(), 3);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (tx, transport) = ChannelTransport::pair(8);
        let mut conn = Connection::open(transport, ConnectionOptions::default());
        let token = CancellationToken::new();

        let canceller = token.clone();
        conn.on("stop", move |_| canceller.cancel());
        tx.send(ServerEvent::new("stop", json!({}))).await.unwrap();
        tx.send(ServerEvent::new("stop", json!({}))).await.unwrap();

        assert_eq!(conn.run(&token).await, 1);
        assert_eq!(conn.dispatched(), 1);
        conn.close().await;
        assert!(tx.is_closed());
    }
}
