//! Remote behavior-tree debugging core for Arbor.
//!
//! The [`DebugServer`] lets debugger clients pick one zone to watch, pause,
//! step and resume it, inspect one agent's live tree, and edit that tree
//! while the simulation runs. Commands from any thread go through an
//! [`EventQueue`] that the simulation thread drains once per tick, so
//! session state only ever changes on that thread.
//!
//! # Modules
//!
//! - [`server`] -- Public commands, per-tick dispatcher, tree edits
//! - [`queue`] -- The inbound event mailbox
//! - [`event`] -- Queued command kinds
//! - [`session`] -- Session state, the active zone slot, published summaries
//! - [`broadcast`] -- Snapshot message builders
//! - [`transport`] -- Outbound delivery trait and test doubles
//! - [`runner`] -- The simulation tick loop
//! - [`config`] -- YAML configuration
//! - [`error`] -- Command errors and their classification

pub mod broadcast;
pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod runner;
pub mod server;
pub mod session;
pub mod transport;

pub use config::{ArborConfig, ConfigError, TreeConfig, ZoneConfig};
pub use error::{DebugError, ErrorKind};
pub use event::Event;
pub use queue::EventQueue;
pub use runner::{
    NoOpCallback, RunControl, RunnerError, SimulationEndReason, SimulationResult, TickCallback,
    TickSummary, run_simulation,
};
pub use server::DebugServer;
pub use session::{ActiveZone, DebugState, SessionState, SessionSummary};
pub use transport::{Delivery, NullTransport, RecordingTransport, Transport};
