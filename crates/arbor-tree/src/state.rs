//! Per-agent run state of a behavior tree.
//!
//! Trees describe structure only. Everything that changes while an agent
//! executes its tree (last execution time, last status, the child a
//! composite is working on, the last condition description) lives in a
//! [`RunState`] owned by the agent, keyed by [`NodeId`]. Snapshot code reads
//! it through `&RunState`, so observing an agent can never disturb it.

use std::collections::BTreeMap;

use arbor_types::{NodeId, TreeNodeStatus};

use crate::node::{NodeKind, TreeNode};

/// Execution bookkeeping for one node of one agent's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRunState {
    /// Agent time (millis) of the last execution, `-1` if never executed.
    pub last_exec_millis: i64,
    /// Status returned by the last execution.
    pub last_status: TreeNodeStatus,
    /// Child a composite selected (or is resuming) on its last run.
    ///
    /// Keyed by id so removing a sibling never shifts it onto another child.
    pub selected_child: Option<NodeId>,
    /// Condition description recorded at the last evaluation.
    pub condition: Option<String>,
    /// Agent time at which an `Idle` leaf started waiting.
    pub idle_since: Option<i64>,
}

impl Default for NodeRunState {
    fn default() -> Self {
        Self {
            last_exec_millis: -1,
            last_status: TreeNodeStatus::Unknown,
            selected_child: None,
            condition: None,
            idle_since: None,
        }
    }
}

/// Run state of every node an agent has executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    nodes: BTreeMap<NodeId, NodeRunState>,
}

impl RunState {
    /// Create an empty run state.
    pub const fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Run state of a node, if it has ever executed.
    pub fn get(&self, id: NodeId) -> Option<&NodeRunState> {
        self.nodes.get(&id)
    }

    /// Mutable run state of a node, created on first access.
    pub fn entry(&mut self, id: NodeId) -> &mut NodeRunState {
        self.nodes.entry(id).or_default()
    }

    /// Agent time of the node's last execution, `-1` if never executed.
    pub fn last_exec_millis(&self, id: NodeId) -> i64 {
        self.get(id).map_or(-1, |s| s.last_exec_millis)
    }

    /// Status of the node's last execution.
    pub fn last_status(&self, id: NodeId) -> TreeNodeStatus {
        self.get(id).map_or(TreeNodeStatus::Unknown, |s| s.last_status)
    }

    /// Description recorded at the node's last condition evaluation.
    pub fn condition_description(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|s| s.condition.as_deref())
    }

    /// Which children of `node` the node currently considers running.
    ///
    /// The returned vector is parallel to `node.children()`.
    pub fn running_children(&self, node: &TreeNode) -> Vec<bool> {
        let children = node.children();
        match node.kind() {
            NodeKind::Sequence | NodeKind::PrioritySelector | NodeKind::RandomSelector => {
                let selected = self.get(node.id()).and_then(|s| s.selected_child);
                children.iter().map(|c| selected == Some(c.id())).collect()
            }
            _ => children
                .iter()
                .map(|c| self.last_status(c.id()) == TreeNodeStatus::Running)
                .collect(),
        }
    }

    /// Drop the run state of the given nodes.
    pub fn forget(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.nodes.remove(&id);
        }
    }

    /// Drop all run state, as if the tree never executed.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Number of nodes with recorded state.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node has recorded state.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
