//! Zones: named groups of agents forming one debuggable partition.
//!
//! Agents live behind a per-agent [`Mutex`], so the debugger can lock a
//! single agent for an edit while the rest of the zone keeps running, and
//! parallel fan-out never hands the same agent to two closures.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arbor_types::CharacterId;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::debug;

use crate::agent::Agent;
use crate::error::ZoneError;

/// Shared handle to one agent of a zone.
pub type AgentHandle = Arc<Mutex<Agent>>;

/// A named collection of agents with a debug flag.
#[derive(Debug)]
pub struct Zone {
    name: String,
    debug: AtomicBool,
    agents: RwLock<BTreeMap<CharacterId, AgentHandle>>,
}

impl Zone {
    /// Create an empty zone.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            debug: AtomicBool::new(false),
            agents: RwLock::new(BTreeMap::new()),
        }
    }

    /// The zone name shown to debugger clients.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a debugger currently watches this zone.
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Acquire)
    }

    /// Set the debug flag. Returns the previous value.
    pub fn set_debug(&self, enabled: bool) -> bool {
        self.debug.swap(enabled, Ordering::AcqRel)
    }

    // -------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------

    /// Add an agent.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DuplicateAgent`] if an agent for the same
    /// character is already present.
    pub fn add_agent(&self, agent: Agent) -> Result<AgentHandle, ZoneError> {
        let id = agent.id();
        let mut agents = self.agents.write();
        if agents.contains_key(&id) {
            return Err(ZoneError::DuplicateAgent {
                zone: self.name.clone(),
                character_id: id,
            });
        }
        let handle = Arc::new(Mutex::new(agent));
        agents.insert(id, Arc::clone(&handle));
        debug!(zone = %self.name, character_id = %id, "agent added");
        Ok(handle)
    }

    /// Remove an agent, returning its handle if it was present.
    pub fn remove_agent(&self, id: CharacterId) -> Option<AgentHandle> {
        let removed = self.agents.write().remove(&id);
        if removed.is_some() {
            debug!(zone = %self.name, character_id = %id, "agent removed");
        }
        removed
    }

    /// Direct lookup of an agent.
    pub fn get_ai(&self, id: CharacterId) -> Option<AgentHandle> {
        self.agents.read().get(&id).cloned()
    }

    /// Ids of all agents, ascending.
    pub fn agent_ids(&self) -> Vec<CharacterId> {
        self.agents.read().keys().copied().collect()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    /// Whether the zone has no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }

    // -------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------

    /// Call `f` for every agent in id order, one at a time.
    pub fn execute(&self, mut f: impl FnMut(&Agent)) {
        for handle in self.handles() {
            f(&handle.lock());
        }
    }

    /// Call `f` once for the agent `id`. Returns `None` if the agent is
    /// not in the zone, which is how callers detect a vanished agent.
    pub fn execute_on<R>(&self, id: CharacterId, f: impl FnOnce(&Agent) -> R) -> Option<R> {
        let handle = self.get_ai(id)?;
        let agent = handle.lock();
        Some(f(&agent))
    }

    /// Call `f` for every agent, spread over the rayon pool. Each agent is
    /// handed to exactly one invocation.
    pub fn execute_parallel(&self, f: impl Fn(&mut Agent) + Sync + Send) {
        self.handles().par_iter().for_each(|handle| f(&mut handle.lock()));
    }

    /// Run one regular tick for every agent. Paused agents skip it.
    pub fn update(&self, delta_millis: i64) {
        self.execute_parallel(|agent| {
            agent.tick(delta_millis);
        });
    }

    /// Snapshot of the agent handles, so no zone lock is held while
    /// callbacks run.
    fn handles(&self) -> Vec<AgentHandle> {
        self.agents.read().values().cloned().collect()
    }
}
