//! One simulated agent: a character driven by a behavior tree.
//!
//! The agent owns its tree, the per-agent [`RunState`] that execution
//! writes into, its aggro table, and its own clock. Structural edits go
//! through the agent so that run state of removed nodes is forgotten in
//! the same step as the edit.

use arbor_tree::{BehaviorTree, ExecContext, RunState, TreeError, TreeNode};
use arbor_types::{Character, CharacterId, NodeId, TreeNodeStatus};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::aggro::AggroTable;

/// A character plus the behavior tree that drives it.
#[derive(Debug, Clone)]
pub struct Agent {
    character: Character,
    behaviour: BehaviorTree,
    run_state: RunState,
    aggro: AggroTable,
    paused: bool,
    time_millis: i64,
    last_status: TreeNodeStatus,
    rng: StdRng,
}

impl Agent {
    /// Create an unpaused agent at time zero.
    ///
    /// `seed` drives every random decision the tree makes, so two agents
    /// built with the same seed and tree behave identically.
    pub fn new(character: Character, behaviour: BehaviorTree, seed: u64) -> Self {
        Self {
            character,
            behaviour,
            run_state: RunState::new(),
            aggro: AggroTable::new(),
            paused: false,
            time_millis: 0,
            last_status: TreeNodeStatus::Unknown,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builder-style replacement of the aggro table.
    #[must_use]
    pub fn with_aggro(mut self, aggro: AggroTable) -> Self {
        self.aggro = aggro;
        self
    }

    /// Identifier of the driven character, also the agent id.
    pub const fn id(&self) -> CharacterId {
        self.character.id
    }

    /// The driven character.
    pub const fn character(&self) -> &Character {
        &self.character
    }

    /// Mutable access to the driven character.
    pub const fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    /// The behavior tree.
    pub const fn behaviour(&self) -> &BehaviorTree {
        &self.behaviour
    }

    /// Install a new behavior tree, dropping all run state.
    pub fn set_behaviour(&mut self, behaviour: BehaviorTree) {
        self.behaviour = behaviour;
        self.run_state.clear();
        self.last_status = TreeNodeStatus::Unknown;
    }

    /// Run state written by the last executions.
    pub const fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// The aggro table.
    pub const fn aggro(&self) -> &AggroTable {
        &self.aggro
    }

    /// Mutable access to the aggro table.
    pub const fn aggro_mut(&mut self) -> &mut AggroTable {
        &mut self.aggro
    }

    /// Whether the agent skips regular ticks.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume regular ticks.
    pub const fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Agent time in milliseconds, advanced by every executed tick.
    pub const fn time_millis(&self) -> i64 {
        self.time_millis
    }

    /// Status the root returned on the last executed tick.
    pub const fn last_status(&self) -> TreeNodeStatus {
        self.last_status
    }

    // -------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------

    /// Regular simulation tick. Returns `None` without doing anything while
    /// the agent is paused.
    pub fn tick(&mut self, delta_millis: i64) -> Option<TreeNodeStatus> {
        if self.paused {
            return None;
        }
        Some(self.execute(delta_millis))
    }

    /// Manual single step for a paused agent: unpause, execute one tick of
    /// `delta_millis`, pause again.
    ///
    /// Returns `None` and changes nothing if the agent is not paused.
    pub fn step(&mut self, delta_millis: i64) -> Option<TreeNodeStatus> {
        if !self.paused {
            return None;
        }
        self.paused = false;
        let status = self.execute(delta_millis);
        self.paused = true;
        Some(status)
    }

    /// Forget all run state, as if the tree had never executed. The tree,
    /// the clock, and the pause flag are untouched.
    pub fn reset_state(&mut self) {
        self.run_state.clear();
        self.last_status = TreeNodeStatus::Unknown;
    }

    fn execute(&mut self, delta_millis: i64) -> TreeNodeStatus {
        self.time_millis = self.time_millis.saturating_add(delta_millis.max(0));
        self.aggro.decay(delta_millis);
        let mut ctx = ExecContext {
            character: &mut self.character,
            aggro: self.aggro.entries(),
            run_state: &mut self.run_state,
            rng: &mut self.rng,
            time_millis: self.time_millis,
        };
        let status = self.behaviour.root().execute(&mut ctx, delta_millis);
        self.last_status = status;
        status
    }

    // -------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------

    /// An id not yet used in this agent's tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IdSpaceExhausted`] when the largest id is
    /// already `u32::MAX`.
    pub fn next_node_id(&self) -> Result<NodeId, TreeError> {
        self.behaviour.next_free_id()
    }

    /// Append `node` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] or [`TreeError::ChildRejected`];
    /// the tree is unchanged on error.
    pub fn add_node(&mut self, parent: NodeId, node: TreeNode) -> Result<(), TreeError> {
        let ids = node.ids();
        self.behaviour.add_child(parent, node)?;
        self.run_state.forget(ids);
        Ok(())
    }

    /// Replace node `id`, moving its children onto `node`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] or [`TreeError::ChildRejected`];
    /// the tree is unchanged on error.
    pub fn replace_node(&mut self, id: NodeId, node: TreeNode) -> Result<TreeNode, TreeError> {
        let old = self.behaviour.replace_node(id, node)?;
        self.run_state.forget([old.id()]);
        Ok(old)
    }

    /// Remove node `id` together with its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootRemoval`] for the root and
    /// [`TreeError::NodeNotFound`] for unknown ids.
    pub fn remove_node(&mut self, id: NodeId) -> Result<TreeNode, TreeError> {
        let removed = self.behaviour.remove_node(id)?;
        self.run_state.forget(removed.ids());
        Ok(removed)
    }
}
