//! Outbound delivery boundary.
//!
//! The server decides what to send and to whom; a [`Transport`] does the
//! sending. Implementations must not block the caller: the tick thread
//! calls these methods while it owns the session.

use arbor_types::{ClientId, ServerMessage};
use parking_lot::Mutex;

/// Delivers server messages to debugger clients.
pub trait Transport: Send + Sync {
    /// Send `message` to every connected client.
    fn broadcast(&self, message: &ServerMessage);

    /// Send `message` to one client. Unknown clients are ignored.
    fn send_to(&self, client: ClientId, message: &ServerMessage);
}

/// A transport with nobody listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn broadcast(&self, _message: &ServerMessage) {}

    fn send_to(&self, _client: ClientId, _message: &ServerMessage) {}
}

/// One message captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Sent to everyone.
    Broadcast(ServerMessage),
    /// Sent to a single client.
    Unicast(ClientId, ServerMessage),
}

impl Delivery {
    /// The delivered message.
    pub const fn message(&self) -> &ServerMessage {
        match self {
            Self::Broadcast(message) | Self::Unicast(_, message) => message,
        }
    }
}

/// Transport that records every delivery, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded deliveries, oldest first.
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock())
    }

    /// Messages broadcast so far, without consuming them.
    pub fn broadcasts(&self) -> Vec<ServerMessage> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Broadcast(message) => Some(message.clone()),
                Delivery::Unicast(..) => None,
            })
            .collect()
    }

    /// Messages sent to `client` so far, without consuming them.
    pub fn sent_to(&self, client: ClientId) -> Vec<ServerMessage> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Unicast(to, message) if *to == client => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn broadcast(&self, message: &ServerMessage) {
        self.deliveries.lock().push(Delivery::Broadcast(message.clone()));
    }

    fn send_to(&self, client: ClientId, message: &ServerMessage) {
        self.deliveries
            .lock()
            .push(Delivery::Unicast(client, message.clone()));
    }
}
