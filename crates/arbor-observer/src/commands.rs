//! Dispatch of decoded client commands onto the debug server.
//!
//! Session commands are queued and acknowledged immediately; the effect
//! shows up in the broadcasts after the next tick. Tree edits run
//! synchronously, so their acknowledgement carries the real outcome.

use arbor_core::DebugServer;
use arbor_types::{ClientMessage, CommandKind, ServerMessage};

/// Apply one client command and build the reply for the sender.
pub fn dispatch(server: &DebugServer, message: ClientMessage) -> ServerMessage {
    match message {
        ClientMessage::Select { character_id } => {
            server.select(character_id);
            ServerMessage::ack(CommandKind::Select)
        }
        ClientMessage::Pause { paused } => {
            server.pause(paused);
            ServerMessage::ack(CommandKind::Pause)
        }
        ClientMessage::Step { step_millis } => {
            if step_millis < 0 {
                return ServerMessage::nack(CommandKind::Step, "step_millis must not be negative");
            }
            server.step(step_millis);
            ServerMessage::ack(CommandKind::Step)
        }
        ClientMessage::Reset => {
            // Without a zone under debug this is a no-op, not an error.
            server.reset();
            ServerMessage::ack(CommandKind::Reset)
        }
        ClientMessage::ChangeZone { name } => {
            server.set_debug_zone(name);
            ServerMessage::ack(CommandKind::ChangeZone)
        }
        ClientMessage::AddNode {
            character_id,
            parent_node_id,
            name,
            node_type,
            condition,
        } => match server.add_node(character_id, parent_node_id, &name, &node_type, &condition) {
            Ok(_) => ServerMessage::ack(CommandKind::AddNode),
            Err(e) => ServerMessage::nack(CommandKind::AddNode, e.to_string()),
        },
        ClientMessage::UpdateNode {
            character_id,
            node_id,
            name,
            node_type,
            condition,
        } => match server.update_node(character_id, node_id, &name, &node_type, &condition) {
            Ok(()) => ServerMessage::ack(CommandKind::UpdateNode),
            Err(e) => ServerMessage::nack(CommandKind::UpdateNode, e.to_string()),
        },
        ClientMessage::DeleteNode {
            character_id,
            node_id,
        } => match server.delete_node(character_id, node_id) {
            Ok(()) => ServerMessage::ack(CommandKind::DeleteNode),
            Err(e) => ServerMessage::nack(CommandKind::DeleteNode, e.to_string()),
        },
        ClientMessage::Ping => ServerMessage::Pong,
    }
}
