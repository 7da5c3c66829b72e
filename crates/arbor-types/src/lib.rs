//! Shared type definitions for the Arbor behavior-tree debugger.
//!
//! This crate is the single source of truth for the identifiers, snapshot
//! shapes, and protocol messages exchanged between the debug server and
//! remote debugger clients. Types flow to `TypeScript` via `ts-rs` for
//! browser-based debugger front ends.
//!
//! # Modules
//!
//! - [`ids`] -- Character, node, and client identifiers
//! - [`enums`] -- Node execution status and command kinds
//! - [`structs`] -- Characters, aggro entries, and snapshot structures
//! - [`protocol`] -- Server-to-client and client-to-server messages

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CommandKind, TreeNodeStatus};
pub use ids::{CharacterId, ClientId, NodeId};
pub use protocol::{ClientMessage, ServerMessage};
pub use structs::{AggroEntry, AgentStateWorld, Character, StateNode, StateNodeStatic, Vec3};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the debugger front end.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::CharacterId::export_all();
        let _ = crate::ids::NodeId::export_all();
        let _ = crate::ids::ClientId::export_all();

        // Enums
        let _ = crate::enums::TreeNodeStatus::export_all();
        let _ = crate::enums::CommandKind::export_all();

        // Structs
        let _ = crate::structs::Vec3::export_all();
        let _ = crate::structs::Character::export_all();
        let _ = crate::structs::AggroEntry::export_all();
        let _ = crate::structs::AgentStateWorld::export_all();
        let _ = crate::structs::StateNodeStatic::export_all();
        let _ = crate::structs::StateNode::export_all();

        // Protocol
        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::ClientMessage::export_all();
    }
}
