//! Core data structures: characters, aggro entries, and the snapshot shapes
//! the debugger consumes.
//!
//! Snapshot structs are plain data. They are assembled on the simulation
//! thread and handed to the transport by value, so nothing here holds a
//! reference into live simulation state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::TreeNodeStatus;
use crate::ids::{CharacterId, NodeId};

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (height).
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vec3 {
    /// Construct a vector from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The simulated body an agent controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Character {
    /// Character identifier, also the agent identifier.
    pub id: CharacterId,
    /// Current world position.
    pub position: Vec3,
    /// Heading around the vertical axis, in radians.
    pub orientation: f32,
    /// Free-form key/value attributes shown in the debugger.
    pub attributes: BTreeMap<String, String>,
}

impl Character {
    /// Create a character at the given position facing along +X.
    pub const fn new(id: CharacterId, position: Vec3) -> Self {
        Self {
            id,
            position,
            orientation: 0.0,
            attributes: BTreeMap::new(),
        }
    }
}

/// One row of an agent's aggro (threat) table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AggroEntry {
    /// The character the threat is directed at.
    pub character_id: CharacterId,
    /// Accumulated threat value.
    pub aggro: f32,
}

/// Per-agent world state included in a full-state broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentStateWorld {
    /// The character this state belongs to.
    pub character_id: CharacterId,
    /// Current world position.
    pub position: Vec3,
    /// Heading in radians.
    pub orientation: f32,
    /// Character attributes at broadcast time.
    pub attributes: BTreeMap<String, String>,
}

/// Static description of one behavior-tree node.
///
/// The static snapshot is a pre-order flattening of the tree: the root
/// first, then each child followed by its own descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateNodeStatic {
    /// Node identifier.
    pub node_id: NodeId,
    /// Display name given when the node was created.
    pub name: String,
    /// Registered node type name (e.g. `PrioritySelector`).
    pub node_type: String,
    /// Raw parameter string from the type expression.
    pub parameters: String,
    /// Name of the guarding condition, empty when unguarded.
    pub condition_name: String,
    /// Parameters of the guarding condition.
    pub condition_parameters: String,
}

/// Live execution state of one node and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateNode {
    /// Node identifier.
    pub node_id: NodeId,
    /// Condition description with the results of its last evaluation.
    pub condition: String,
    /// Milliseconds since the node last ran, or `-1` if it never ran.
    pub last_run_millis: i64,
    /// Status of the node's last execution.
    pub status: TreeNodeStatus,
    /// Whether the parent currently considers this node running.
    pub running: bool,
    /// Child node states in tree order.
    pub children: Vec<StateNode>,
}
