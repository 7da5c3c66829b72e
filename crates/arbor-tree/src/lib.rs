//! Behavior trees for Arbor agents.
//!
//! A [`BehaviorTree`] is a plain tree of [`TreeNode`]s, each with a stable
//! [`NodeId`](arbor_types::NodeId), an optional guard [`Condition`], and a
//! [`NodeKind`] that decides how it runs its children. Node types and
//! conditions are built from textual expressions (`Idle{500}`,
//! `Not(HasEnemies{2})`) through the [`AiRegistry`].
//!
//! Trees carry no per-agent data. Execution results live in a [`RunState`]
//! owned by the agent and are written through an [`ExecContext`].
//!
//! # Modules
//!
//! - [`grammar`] -- The `Name{params}(args)` expression grammar
//! - [`registry`] -- Name to constructor lookup for nodes and conditions
//! - [`node`] -- Tree nodes, node kinds, and arity rules
//! - [`tree`] -- Structural edits on whole trees
//! - [`condition`] -- Guard conditions and their descriptions
//! - [`state`] -- Per-agent run state
//! - [`exec`] -- Tree execution
//! - [`error`] -- Parse and edit errors

pub mod condition;
pub mod error;
pub mod exec;
pub mod grammar;
pub mod node;
pub mod registry;
pub mod state;
pub mod tree;

pub use condition::{Condition, ConditionKind};
pub use error::TreeError;
pub use exec::ExecContext;
pub use grammar::{Expression, parse_expression};
pub use node::{NodeKind, TreeNode};
pub use registry::{AiRegistry, ConditionArgs, ConditionFactory, NodeArgs, NodeFactory};
pub use state::{NodeRunState, RunState};
pub use tree::BehaviorTree;
