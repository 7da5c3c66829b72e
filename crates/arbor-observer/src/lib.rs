//! Network transport for the Arbor debug server.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/debug`) speaking the JSON debugger
//!   protocol: client commands in, acknowledgements and snapshots out
//! - **REST endpoints** for the session summary, the zone list and
//!   one-off agent inspection
//! - **Minimal HTML page** (`GET /`) showing the session status
//!
//! # Architecture
//!
//! [`ClientHub`] implements [`Transport`](arbor_core::Transport) for the
//! [`DebugServer`](arbor_core::DebugServer). The tick thread hands it
//! finished messages; it encodes them once and fans them out over
//! channels, so the tick thread never waits on a socket. Inbound frames
//! are decoded in each connection task and turned into server commands
//! by [`commands::dispatch`].

pub mod commands;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerError, spawn_observer, start_server};
pub use state::{AppState, ClientHub};
