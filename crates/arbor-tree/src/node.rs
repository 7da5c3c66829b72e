//! Behavior-tree nodes and their structural edits.
//!
//! A [`TreeNode`] owns its children. There are no parent pointers: parent
//! lookup is a depth-first search from the node the search starts at, which
//! is cheap for the shallow trees agents use and keeps ownership simple.

use arbor_types::NodeId;

use crate::condition::Condition;
use crate::error::TreeError;

/// Resolved behavior of a node, produced by the registry from a type name.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Runs children in order until one fails; resumes a running child.
    Sequence,
    /// Runs the first child whose condition allows it to execute.
    PrioritySelector,
    /// Like [`NodeKind::PrioritySelector`] but tries children in random order.
    RandomSelector,
    /// Runs every child each tick.
    Parallel,
    /// Swaps `Finished` and `Failed` of its single child.
    Invert,
    /// Reports `Finished` whenever its child completes.
    Succeed,
    /// Reports `Failed` whenever its child completes.
    Fail,
    /// Stays `Running` until the given number of milliseconds passed.
    Idle {
        /// Wait duration in agent milliseconds.
        millis: i64,
    },
    /// Moves the character a small random step each tick.
    Wander {
        /// Movement speed in units per second.
        speed: f32,
    },
}

impl NodeKind {
    /// Maximum number of children this kind accepts; `None` for unbounded.
    pub const fn max_children(&self) -> Option<usize> {
        match self {
            Self::Sequence | Self::PrioritySelector | Self::RandomSelector | Self::Parallel => None,
            Self::Invert | Self::Succeed | Self::Fail => Some(1),
            Self::Idle { .. } | Self::Wander { .. } => Some(0),
        }
    }

    /// Whether a node of this kind can hold `count` children.
    pub fn accepts(&self, count: usize) -> bool {
        self.max_children().is_none_or(|max| count <= max)
    }
}

/// One node of a behavior tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    id: NodeId,
    name: String,
    node_type: String,
    parameters: String,
    kind: NodeKind,
    condition: Option<Condition>,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a childless, unguarded node.
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        node_type: impl Into<String>,
        parameters: impl Into<String>,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            node_type: node_type.into(),
            parameters: parameters.into(),
            kind,
            condition: None,
            children: Vec::new(),
        }
    }

    /// Builder-style variant of [`TreeNode::set_condition`].
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Node identifier.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered type name.
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Raw parameter string of the type expression.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Resolved kind.
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Guarding condition, if any.
    pub const fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Replace the guarding condition.
    pub fn set_condition(&mut self, condition: Option<Condition>) {
        self.condition = condition;
    }

    /// Children in execution order.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Append a child, subject to this node's arity policy.
    ///
    /// Id uniqueness is the caller's responsibility.
    pub fn add_child(&mut self, child: Self) -> Result<(), TreeError> {
        if !self.kind.accepts(self.children.len().saturating_add(1)) {
            return Err(TreeError::ChildRejected {
                parent: self.id,
                node_type: self.node_type.clone(),
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// Swap the direct child `id` for `replacement`, or remove it when
    /// `replacement` is `None`. Returns the detached child, or `None` (and
    /// changes nothing) if `id` is not a direct child of this node.
    pub fn replace_child(&mut self, id: NodeId, replacement: Option<Self>) -> Option<Self> {
        let index = self.children.iter().position(|c| c.id == id)?;
        match replacement {
            Some(node) => self
                .children
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, node)),
            None => Some(self.children.remove(index)),
        }
    }

    /// Append children without consulting the arity policy.
    ///
    /// Only for callers that already validated the final child count.
    pub(crate) fn adopt_children(&mut self, children: Vec<Self>) {
        self.children.extend(children);
    }

    /// The direct child with the given id.
    pub(crate) fn direct_child_mut(&mut self, id: NodeId) -> Option<&mut Self> {
        self.children.iter_mut().find(|c| c.id == id)
    }

    /// Move all children out of this node.
    pub fn take_children(&mut self) -> Vec<Self> {
        std::mem::take(&mut self.children)
    }

    /// Depth-first search for `id`, including this node.
    pub fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Mutable variant of [`TreeNode::find`].
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Depth-first search for the parent of `id` below this node.
    ///
    /// Returns `None` if `id` is this node itself or is not in the subtree.
    pub fn parent_of(&self, id: NodeId) -> Option<&Self> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Mutable variant of [`TreeNode::parent_of`].
    pub fn parent_of_mut(&mut self, id: NodeId) -> Option<&mut Self> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.parent_of_mut(id))
    }

    /// Visit this node and its descendants in pre-order.
    pub fn walk(&self, visit: &mut impl FnMut(&Self)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Ids of this node and all descendants, in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.walk(&mut |n| ids.push(n.id));
        ids
    }

    /// Largest id in this subtree.
    pub fn max_id(&self) -> NodeId {
        self.children
            .iter()
            .map(Self::max_id)
            .fold(self.id, NodeId::max)
    }
}
