//! Error types for debugger commands.
//!
//! Every failed command maps onto one [`ErrorKind`]. None of them is fatal:
//! the caller gets the error back, the server logs it, and session state is
//! left as it was.

use std::fmt;

use arbor_tree::TreeError;
use arbor_types::{CharacterId, NodeId};
use serde::Serialize;

/// Coarse classification of a failed debugger command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A zone, agent, or node does not exist.
    NotFound,
    /// A condition or node type expression did not parse.
    ParseFailure,
    /// The command is not allowed in the current state.
    InvalidOperation,
    /// The selected agent vanished; the selection was cleared.
    StaleSelection,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::ParseFailure => "parse failure",
            Self::InvalidOperation => "invalid operation",
            Self::StaleSelection => "stale selection",
        };
        f.write_str(label)
    }
}

/// Errors returned by debugger commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebugError {
    /// The command needs a zone under debug and there is none.
    #[error("no zone is being debugged")]
    NoActiveZone,

    /// The agent is not part of the zone under debug.
    #[error("agent {character_id} not found in zone '{zone}'")]
    AgentNotFound {
        /// Zone that was searched.
        zone: String,
        /// The missing agent.
        character_id: CharacterId,
    },

    /// The node is not part of the agent's tree.
    #[error("node {node_id} not found in the tree of agent {character_id}")]
    NodeNotFound {
        /// Agent whose tree was searched.
        character_id: CharacterId,
        /// The missing node.
        node_id: NodeId,
    },

    /// The selected agent disappeared between selection and use.
    #[error("selected agent {0} is gone")]
    StaleSelection(CharacterId),

    /// Parsing or the structural edit itself failed.
    #[error("tree edit rejected: {source}")]
    Tree {
        /// The underlying tree error.
        #[from]
        source: TreeError,
    },
}

impl DebugError {
    /// Classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AgentNotFound { .. } | Self::NodeNotFound { .. } => ErrorKind::NotFound,
            Self::StaleSelection(_) => ErrorKind::StaleSelection,
            Self::NoActiveZone => ErrorKind::InvalidOperation,
            Self::Tree { source } => {
                if source.is_parse_failure() {
                    ErrorKind::ParseFailure
                } else if matches!(source, TreeError::NodeNotFound(_)) {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::InvalidOperation
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_errors_are_classified() {
        let parse = DebugError::from(TreeError::UnknownNodeType(String::from("BadType")));
        assert_eq!(parse.kind(), ErrorKind::ParseFailure);

        let root = DebugError::from(TreeError::RootRemoval);
        assert_eq!(root.kind(), ErrorKind::InvalidOperation);

        let missing = DebugError::from(TreeError::NodeNotFound(NodeId::new(3)));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn session_errors_are_classified() {
        assert_eq!(DebugError::NoActiveZone.kind(), ErrorKind::InvalidOperation);
        assert_eq!(
            DebugError::StaleSelection(CharacterId::new(1)).kind(),
            ErrorKind::StaleSelection
        );
        let err = DebugError::AgentNotFound {
            zone: String::from("alpha"),
            character_id: CharacterId::new(9),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "agent 9 not found in zone 'alpha'");
    }
}
