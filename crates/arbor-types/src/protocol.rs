//! Debugger wire protocol message catalog.
//!
//! [`ServerMessage`] flows from the server to debugger clients;
//! [`ClientMessage`] flows the other way. Both are internally tagged JSON
//! objects (`{"type": "...", ...}`). The exact framing is a transport
//! concern; these types only fix the shapes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::CommandKind;
use crate::ids::{CharacterId, NodeId};
use crate::structs::{AggroEntry, AgentStateWorld, StateNode, StateNodeStatic};

/// A message sent from the server to one or all debugger clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Names of every registered zone, in registration order.
    Names {
        /// Zone names.
        names: Vec<String>,
    },
    /// The current global pause state.
    Pause {
        /// Whether the debugged zone is paused.
        paused: bool,
    },
    /// World state of every agent in the debugged zone.
    State {
        /// Per-agent world state.
        states: Vec<AgentStateWorld>,
    },
    /// Static tree structure of the selected agent.
    CharacterStatic {
        /// The selected character.
        character_id: CharacterId,
        /// Pre-order flattened node descriptions.
        nodes: Vec<StateNodeStatic>,
    },
    /// Live execution details of the selected agent.
    CharacterDetails {
        /// The selected character.
        character_id: CharacterId,
        /// Aggro table entries, highest first.
        aggro: Vec<AggroEntry>,
        /// Live state of the tree rooted at the agent's behaviour.
        root: StateNode,
    },
    /// Acknowledgement of a client command.
    Ack {
        /// The command being acknowledged.
        command: CommandKind,
        /// Whether the command was accepted.
        success: bool,
        /// Failure reason, present only when `success` is false.
        reason: Option<String>,
    },
    /// Reply to a client ping.
    Pong,
}

impl ServerMessage {
    /// Build a successful acknowledgement.
    pub const fn ack(command: CommandKind) -> Self {
        Self::Ack {
            command,
            success: true,
            reason: None,
        }
    }

    /// Build a failed acknowledgement carrying a reason.
    pub fn nack(command: CommandKind, reason: impl Into<String>) -> Self {
        Self::Ack {
            command,
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// A command sent by a debugger client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Select an agent for detail broadcasts, or clear the selection.
    Select {
        /// The character to select; `None` clears the selection.
        character_id: Option<CharacterId>,
    },
    /// Pause or resume the debugged zone.
    Pause {
        /// The requested pause state.
        paused: bool,
    },
    /// Advance one manual tick while paused.
    Step {
        /// Simulated milliseconds to advance.
        step_millis: i64,
    },
    /// Reset every agent's tree run state in the debugged zone.
    Reset,
    /// Switch the debugged zone.
    ChangeZone {
        /// Name of the zone to debug.
        name: String,
    },
    /// Append a new node under an existing one.
    AddNode {
        /// Agent owning the tree.
        character_id: CharacterId,
        /// Node that receives the new child.
        parent_node_id: NodeId,
        /// Display name of the new node.
        name: String,
        /// Node type expression (e.g. `Idle{500}`).
        node_type: String,
        /// Condition expression (e.g. `True`).
        condition: String,
    },
    /// Replace an existing node, keeping its children.
    UpdateNode {
        /// Agent owning the tree.
        character_id: CharacterId,
        /// Node to replace.
        node_id: NodeId,
        /// Display name of the replacement.
        name: String,
        /// Node type expression of the replacement.
        node_type: String,
        /// Condition expression of the replacement.
        condition: String,
    },
    /// Remove a node and its subtree.
    DeleteNode {
        /// Agent owning the tree.
        character_id: CharacterId,
        /// Node to remove.
        node_id: NodeId,
    },
    /// Keep-alive probe.
    Ping,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn client_message_parses_tagged_json() {
        let raw = r#"{"type":"add_node","character_id":2,"parent_node_id":1,"name":"Wander","node_type":"Wander","condition":"True"}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::AddNode {
                character_id: CharacterId::new(2),
                parent_node_id: NodeId::new(1),
                name: String::from("Wander"),
                node_type: String::from("Wander"),
                condition: String::from("True"),
            }
        );
    }

    #[test]
    fn select_none_parses_null() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"select","character_id":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::Select { character_id: None });
    }

    #[test]
    fn nack_carries_reason() {
        let msg = ServerMessage::nack(CommandKind::DeleteNode, "cannot delete the root node");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ack");
        assert_eq!(json["command"], "delete_node");
        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "cannot delete the root node");
    }
}
