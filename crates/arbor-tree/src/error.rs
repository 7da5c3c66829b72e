//! Error types for the arbor-tree crate.
//!
//! Parsing and structural edits never panic. Every rejection is reported
//! as a [`TreeError`] and leaves the tree exactly as it was.

use arbor_types::NodeId;

/// Errors produced by expression parsing and structural tree edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The expression is not well formed.
    #[error("syntax error in '{expression}' at offset {position}: {message}")]
    Syntax {
        /// The expression being parsed.
        expression: String,
        /// Byte offset where parsing stopped.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// No node type is registered under this name.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// No condition is registered under this name.
    #[error("unknown condition: {0}")]
    UnknownCondition(String),

    /// The parameters or arguments do not fit the registered kind.
    #[error("invalid parameters for {name} '{parameters}': {reason}")]
    InvalidParameters {
        /// Registered name of the node type or condition.
        name: String,
        /// The raw parameter string.
        parameters: String,
        /// Why the parameters were rejected.
        reason: String,
    },

    /// The node's arity policy does not accept another child.
    #[error("node {parent} ({node_type}) does not accept more children")]
    ChildRejected {
        /// The node that rejected the child.
        parent: NodeId,
        /// Type name of the rejecting node.
        node_type: String,
    },

    /// The node is not part of the tree.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The root node can be replaced but never removed.
    #[error("the root node cannot be removed")]
    RootRemoval,

    /// No identifier is left for a new node.
    #[error("node identifier space exhausted")]
    IdSpaceExhausted,
}

impl TreeError {
    /// Whether this error comes from parsing a type or condition expression.
    pub const fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. }
                | Self::UnknownNodeType(_)
                | Self::UnknownCondition(_)
                | Self::InvalidParameters { .. }
        )
    }
}
