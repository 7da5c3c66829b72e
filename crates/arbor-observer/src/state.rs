//! Shared application state and the client hub.
//!
//! [`ClientHub`] is the [`Transport`] the debug server talks to. Broadcasts
//! are encoded once and pushed through a [`broadcast`] channel every
//! `WebSocket` task subscribes to; unicasts go through a per-client
//! unbounded queue. Neither path ever blocks the tick thread.

use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_core::{DebugServer, Transport};
use arbor_types::{ClientId, ServerMessage};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Fans server messages out to connected `WebSocket` clients.
#[derive(Debug)]
pub struct ClientHub {
    tx: broadcast::Sender<Arc<str>>,
    clients: Mutex<BTreeMap<ClientId, mpsc::UnboundedSender<Arc<str>>>>,
}

impl ClientHub {
    /// Create a hub whose broadcast channel holds `capacity` messages.
    ///
    /// A client that falls further behind skips to the newest message.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            clients: Mutex::new(BTreeMap::new()),
        }
    }

    /// Subscribe to broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    /// Register a client for unicasts.
    pub fn register(&self, client: ClientId) -> mpsc::UnboundedReceiver<Arc<str>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().insert(client, tx);
        rx
    }

    /// Stop delivering unicasts to a client.
    pub fn unregister(&self, client: ClientId) {
        self.clients.lock().remove(&client);
    }

    /// Number of clients registered for unicasts.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    fn encode(message: &ServerMessage) -> Option<Arc<str>> {
        match serde_json::to_string(message) {
            Ok(json) => Some(Arc::from(json)),
            Err(e) => {
                warn!(error = %e, "failed to encode server message");
                None
            }
        }
    }
}

impl Transport for ClientHub {
    fn broadcast(&self, message: &ServerMessage) {
        if let Some(json) = Self::encode(message) {
            // Err only means nobody is subscribed.
            let _ = self.tx.send(json);
        }
    }

    fn send_to(&self, client: ClientId, message: &ServerMessage) {
        let Some(json) = Self::encode(message) else {
            return;
        };
        if let Some(tx) = self.clients.lock().get(&client) {
            let _ = tx.send(json);
        }
    }
}

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The debug server commands are forwarded to.
    pub server: Arc<DebugServer>,
    /// The hub the debug server delivers through.
    pub hub: Arc<ClientHub>,
}

impl AppState {
    /// Bundle a server with the hub it was created with.
    pub const fn new(server: Arc<DebugServer>, hub: Arc<ClientHub>) -> Self {
        Self { server, hub }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let hub = ClientHub::new(8);
        let mut rx = hub.subscribe();
        hub.broadcast(&ServerMessage::Pause { paused: true });
        let json = rx.recv().await.unwrap();
        assert_eq!(&*json, r#"{"type":"pause","paused":true}"#);
    }

    #[tokio::test]
    async fn unicast_reaches_only_its_client() {
        let hub = ClientHub::new(8);
        let a = ClientId::new();
        let b = ClientId::new();
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);

        hub.send_to(a, &ServerMessage::Pong);
        assert_eq!(&*rx_a.recv().await.unwrap(), r#"{"type":"pong"}"#);
        assert!(rx_b.try_recv().is_err());

        hub.unregister(a);
        hub.send_to(a, &ServerMessage::Pong);
        assert_eq!(hub.client_count(), 1);
    }
}
