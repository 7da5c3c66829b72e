//! Enumeration types shared between the server and debugger clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Outcome of executing a behavior-tree node during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TreeNodeStatus {
    /// The node has not been executed yet (or its run state was reset).
    #[default]
    Unknown,
    /// The node's condition evaluated to false, so it did not run.
    CannotExecute,
    /// The node needs more ticks to complete.
    Running,
    /// The node completed successfully.
    Finished,
    /// The node completed unsuccessfully.
    Failed,
    /// The node hit an unexpected state while executing.
    Exception,
}

impl TreeNodeStatus {
    /// Whether the status counts as a failure for composite nodes.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::CannotExecute | Self::Exception)
    }
}

/// The debugger command an acknowledgement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CommandKind {
    /// Agent selection.
    Select,
    /// Global pause toggle.
    Pause,
    /// Single manual step while paused.
    Step,
    /// Reset of every agent's tree run state.
    Reset,
    /// Switch of the debugged zone.
    ChangeZone,
    /// Insertion of a new node.
    AddNode,
    /// Replacement of an existing node.
    UpdateNode,
    /// Removal of an existing node.
    DeleteNode,
}
