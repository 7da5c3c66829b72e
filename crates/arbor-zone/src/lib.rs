//! Agents and zones for the Arbor simulation.
//!
//! A [`Zone`] groups [`Agent`]s under a name and a debug flag. The debug
//! server never creates agents; it looks them up through the zone and runs
//! closures against them, serially, for one agent, or in parallel.
//!
//! # Modules
//!
//! - [`agent`] -- Character, behavior tree, run state, clock, pause flag
//! - [`aggro`] -- Sorted threat tables with decay
//! - [`zone`] -- Agent membership and execution fan-out
//! - [`error`] -- Zone population errors

pub mod aggro;
pub mod agent;
pub mod error;
pub mod zone;

pub use aggro::AggroTable;
pub use agent::Agent;
pub use error::ZoneError;
pub use zone::{AgentHandle, Zone};
