//! An agent's behavior tree as a whole.
//!
//! [`BehaviorTree`] wraps the root node and exposes the tree-level edit
//! operations the debugger uses. Every edit validates first and mutates
//! last: an `Err` always means the tree is unchanged.

use arbor_types::NodeId;

use crate::error::TreeError;
use crate::node::TreeNode;

/// A complete behavior tree owned by one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorTree {
    root: TreeNode,
}

impl BehaviorTree {
    /// Wrap a root node.
    pub const fn new(root: TreeNode) -> Self {
        Self { root }
    }

    /// The root node.
    pub const fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Replace the whole tree, returning the previous root.
    pub fn set_root(&mut self, root: TreeNode) -> TreeNode {
        std::mem::replace(&mut self.root, root)
    }

    /// Node `id`, searching depth-first from the root (root included).
    pub fn get_child(&self, id: NodeId) -> Option<&TreeNode> {
        self.root.find(id)
    }

    /// Parent of `id`; `None` for the root or an unknown id.
    pub fn get_parent(&self, id: NodeId) -> Option<&TreeNode> {
        self.root.parent_of(id)
    }

    /// Whether `id` is part of the tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get_child(id).is_some()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        let mut count = 0_usize;
        self.root.walk(&mut |_| count = count.saturating_add(1));
        count
    }

    /// Always false: a tree has at least its root.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// An id not used by any node in the tree.
    pub fn next_free_id(&self) -> Result<NodeId, TreeError> {
        self.root.max_id().next().ok_or(TreeError::IdSpaceExhausted)
    }

    /// Append `child` under `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: TreeNode) -> Result<(), TreeError> {
        self.root
            .find_mut(parent)
            .ok_or(TreeError::NodeNotFound(parent))?
            .add_child(child)
    }

    /// Replace node `id` with `replacement`, moving the old node's children
    /// onto the replacement. Works for the root as well.
    ///
    /// Returns the detached, now childless, old node.
    pub fn replace_node(&mut self, id: NodeId, mut replacement: TreeNode) -> Result<TreeNode, TreeError> {
        let target = self.get_child(id).ok_or(TreeError::NodeNotFound(id))?;
        let total = target
            .children()
            .len()
            .saturating_add(replacement.children().len());
        if !replacement.kind().accepts(total) {
            return Err(TreeError::ChildRejected {
                parent: replacement.id(),
                node_type: replacement.node_type().to_owned(),
            });
        }

        if self.root.id() == id {
            replacement.adopt_children(self.root.take_children());
            return Ok(self.set_root(replacement));
        }

        let slot = self
            .root
            .parent_of_mut(id)
            .and_then(|parent| parent.direct_child_mut(id))
            .ok_or(TreeError::NodeNotFound(id))?;
        replacement.adopt_children(slot.take_children());
        Ok(std::mem::replace(slot, replacement))
    }

    /// Remove node `id` and its subtree. The root can never be removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<TreeNode, TreeError> {
        if self.root.id() == id {
            return Err(TreeError::RootRemoval);
        }
        let parent = self.root.parent_of_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        parent.replace_child(id, None).ok_or(TreeError::NodeNotFound(id))
    }
}
