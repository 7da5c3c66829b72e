//! The debug server: public commands, the per-tick dispatcher, and tree
//! edits.
//!
//! Public commands never touch session state. They append an [`Event`] to
//! the queue and return. [`DebugServer::update`] runs once per simulation
//! tick on the simulation thread: it drains the queue, applies the events
//! in order, sends the heartbeat broadcast, advances the clock, and
//! publishes a fresh [`SessionSummary`].
//!
//! Tree edits are the exception: they answer synchronously. They run on
//! the caller's thread under the target agent's lock, validate everything
//! before mutating, and queue an `UpdateStaticDetails` event on success so
//! the new structure is rebroadcast on the next tick.

use std::sync::Arc;

use arbor_tree::{AiRegistry, Condition, TreeError};
use arbor_types::{CharacterId, ClientId, NodeId, ServerMessage};
use arbor_zone::{AgentHandle, Zone};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::broadcast;
use crate::error::DebugError;
use crate::event::Event;
use crate::queue::EventQueue;
use crate::session::{ActiveZone, SessionState, SessionSummary};
use crate::transport::Transport;

/// Remote behavior-tree debugging server.
pub struct DebugServer {
    registry: AiRegistry,
    queue: EventQueue<Event>,
    active: ActiveZone,
    session: Mutex<SessionState>,
    summary: RwLock<Arc<SessionSummary>>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for DebugServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugServer")
            .field("active", &self.active.name())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl DebugServer {
    /// Create a server delivering through `transport`.
    pub fn new(registry: AiRegistry, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            queue: EventQueue::new(),
            active: ActiveZone::new(),
            session: Mutex::new(SessionState::new()),
            summary: RwLock::new(Arc::new(SessionSummary::default())),
            transport,
        }
    }

    /// The node and condition registry used for edits.
    pub const fn registry(&self) -> &AiRegistry {
        &self.registry
    }

    /// The zone under debug, as of the last applied event.
    pub fn active_zone(&self) -> Option<Arc<Zone>> {
        self.active.load()
    }

    /// Session snapshot published at the end of the last tick.
    pub fn summary(&self) -> Arc<SessionSummary> {
        Arc::clone(&self.summary.read())
    }

    /// Number of events waiting for the next tick.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    // -------------------------------------------------------------------
    // Public commands (queued)
    // -------------------------------------------------------------------

    /// Select an agent of the zone under debug, or clear the selection.
    pub fn select(&self, character_id: Option<CharacterId>) {
        self.queue.enqueue(Event::Selection { character_id });
    }

    /// Set or clear the global pause.
    pub fn pause(&self, paused: bool) {
        self.queue.enqueue(Event::Pause { paused });
    }

    /// Advance the paused zone by one tick of `step_millis`.
    pub fn step(&self, step_millis: i64) {
        self.queue.enqueue(Event::Step { step_millis });
    }

    /// Reset the run state of every agent in the zone under debug.
    ///
    /// Returns `false` and queues nothing when no zone is under debug.
    pub fn reset(&self) -> bool {
        let Some(zone) = self.active.load() else {
            debug!("reset ignored, no zone under debug");
            return false;
        };
        self.queue.enqueue(Event::Reset { zone });
        true
    }

    /// Switch the zone under debug.
    pub fn set_debug_zone(&self, name: impl Into<String>) {
        self.queue.enqueue(Event::SetDebug {
            zone_name: name.into(),
        });
    }

    /// A debugger client connected.
    pub fn on_client_connect(&self, client: ClientId) {
        self.queue.enqueue(Event::NewConnection { client });
    }

    /// A debugger client disconnected.
    pub fn on_client_disconnect(&self, client: ClientId) {
        let seen_zone = self.active.load();
        self.queue.enqueue(Event::Disconnect { client, seen_zone });
    }

    /// Make a zone available for debugging.
    pub fn register_zone(&self, zone: Arc<Zone>) {
        self.queue.enqueue(Event::ZoneAdd { zone });
    }

    /// Withdraw a zone. Debugging stops if it was the zone under debug.
    pub fn unregister_zone(&self, zone: Arc<Zone>) {
        self.queue.enqueue(Event::ZoneRemove { zone });
    }

    // -------------------------------------------------------------------
    // Tree edits (synchronous)
    // -------------------------------------------------------------------

    /// Append a new node under `parent_id` in the agent's tree. The new node
    /// gets the next free id, which is returned.
    ///
    /// # Errors
    ///
    /// Fails without changing the tree when no zone is under debug, the
    /// agent or parent node does not exist, an expression does not parse,
    /// or the parent does not accept another child.
    pub fn add_node(
        &self,
        character_id: CharacterId,
        parent_id: NodeId,
        name: &str,
        node_type: &str,
        condition: &str,
    ) -> Result<NodeId, DebugError> {
        let (zone, handle) = self.resolve_agent(character_id)?;
        let result = self.try_add_node(&handle, parent_id, name, node_type, condition);
        self.finish_edit("add_node", &zone, character_id, parent_id, result)
    }

    /// Replace node `node_id` in the agent's tree. The replacement keeps
    /// the id and adopts the old node's children.
    ///
    /// # Errors
    ///
    /// Fails without changing the tree when no zone is under debug, the
    /// agent or node does not exist, an expression does not parse, or the
    /// new node type cannot hold the existing children.
    pub fn update_node(
        &self,
        character_id: CharacterId,
        node_id: NodeId,
        name: &str,
        node_type: &str,
        condition: &str,
    ) -> Result<(), DebugError> {
        let (zone, handle) = self.resolve_agent(character_id)?;
        let result = self.try_update_node(&handle, node_id, name, node_type, condition);
        self.finish_edit("update_node", &zone, character_id, node_id, result)
    }

    /// Remove node `node_id` and its subtree from the agent's tree.
    ///
    /// # Errors
    ///
    /// Fails without changing the tree when no zone is under debug, the
    /// agent or node does not exist, or the node is the root.
    pub fn delete_node(&self, character_id: CharacterId, node_id: NodeId) -> Result<(), DebugError> {
        let (zone, handle) = self.resolve_agent(character_id)?;
        let result = Self::try_delete_node(&handle, node_id);
        self.finish_edit("delete_node", &zone, character_id, node_id, result)
    }

    fn try_add_node(
        &self,
        handle: &AgentHandle,
        parent_id: NodeId,
        name: &str,
        node_type: &str,
        condition: &str,
    ) -> Result<NodeId, DebugError> {
        let mut agent = handle.lock();
        if agent.behaviour().get_child(parent_id).is_none() {
            return Err(DebugError::NodeNotFound {
                character_id: agent.id(),
                node_id: parent_id,
            });
        }
        let condition = self.parse_condition(condition)?;
        let id = agent.next_node_id()?;
        let mut node = self.registry.parse_node(node_type, name, id)?;
        node.set_condition(condition);
        agent.add_node(parent_id, node)?;
        Ok(id)
    }

    fn try_update_node(
        &self,
        handle: &AgentHandle,
        node_id: NodeId,
        name: &str,
        node_type: &str,
        condition: &str,
    ) -> Result<(), DebugError> {
        let mut agent = handle.lock();
        if agent.behaviour().get_child(node_id).is_none() {
            return Err(DebugError::NodeNotFound {
                character_id: agent.id(),
                node_id,
            });
        }
        let condition = self.parse_condition(condition)?;
        let mut node = self.registry.parse_node(node_type, name, node_id)?;
        node.set_condition(condition);
        agent.replace_node(node_id, node)?;
        Ok(())
    }

    fn try_delete_node(handle: &AgentHandle, node_id: NodeId) -> Result<(), DebugError> {
        let mut agent = handle.lock();
        if agent.behaviour().root().id() == node_id {
            return Err(DebugError::from(TreeError::RootRemoval));
        }
        if agent.behaviour().get_child(node_id).is_none() {
            return Err(DebugError::NodeNotFound {
                character_id: agent.id(),
                node_id,
            });
        }
        agent.remove_node(node_id)?;
        Ok(())
    }

    fn resolve_agent(&self, character_id: CharacterId) -> Result<(Arc<Zone>, AgentHandle), DebugError> {
        let zone = self.active.load().ok_or(DebugError::NoActiveZone)?;
        let handle = zone
            .get_ai(character_id)
            .ok_or_else(|| DebugError::AgentNotFound {
                zone: zone.name().to_owned(),
                character_id,
            })?;
        Ok((zone, handle))
    }

    /// An empty expression means "no condition".
    fn parse_condition(&self, expression: &str) -> Result<Option<Condition>, DebugError> {
        if expression.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.registry.parse_condition(expression)?))
    }

    fn finish_edit<T>(
        &self,
        operation: &'static str,
        zone: &Arc<Zone>,
        character_id: CharacterId,
        node_id: NodeId,
        result: Result<T, DebugError>,
    ) -> Result<T, DebugError> {
        match &result {
            Ok(_) => {
                info!(operation, zone = zone.name(), %character_id, %node_id, "tree edited");
                self.queue.enqueue(Event::UpdateStaticDetails {
                    zone: Arc::clone(zone),
                });
            }
            Err(error) => {
                warn!(operation, zone = zone.name(), %character_id, %node_id, kind = %error.kind(), %error, "tree edit rejected");
            }
        }
        result
    }

    // -------------------------------------------------------------------
    // Tick driver
    // -------------------------------------------------------------------

    /// Apply every queued event, broadcast, and advance the clock by
    /// `delta_millis`. Call once per simulation tick.
    pub fn update(&self, delta_millis: i64) {
        let events = self.queue.drain_all();
        let mut session = self.session.lock();

        let mut broadcasted = false;
        for event in events {
            debug!(event = event.kind(), "applying debug event");
            broadcasted |= self.apply(&mut session, event);
        }
        self.heartbeat(&mut session, broadcasted);
        session.advance(delta_millis);

        let active = self.active.load();
        *self.summary.write() = Arc::new(session.summary(active.as_ref()));
    }

    /// Apply one event. Returns `true` if it already broadcast the world
    /// state and agent details for this tick.
    fn apply(&self, session: &mut SessionState, event: Event) -> bool {
        match event {
            Event::NewConnection { client } => {
                session.clients.insert(client);
                info!(%client, clients = session.clients.len(), "debugger connected");
                self.transport.send_to(client, &broadcast::pause(session.paused));
                self.transport.send_to(client, &broadcast::names(&session.names));
                false
            }
            Event::Disconnect { client, seen_zone } => {
                session.clients.remove(&client);
                info!(%client, clients = session.clients.len(), "debugger disconnected");
                if session.clients.is_empty()
                    && let Some(zone) = seen_zone
                    && self.active.compare_and_clear(&zone)
                {
                    self.release(session, &zone);
                    info!(zone = zone.name(), "debug session ended, last debugger left");
                }
                false
            }
            Event::ZoneAdd { zone } => {
                if session.position_of(&zone).is_some() || session.find_zone(zone.name()).is_some() {
                    warn!(zone = zone.name(), "zone already registered");
                    return false;
                }
                session.zones.push(Arc::clone(&zone));
                session.rebuild_names();
                info!(zone = zone.name(), agents = zone.len(), "zone registered");
                self.transport.broadcast(&broadcast::names(&session.names));
                false
            }
            Event::ZoneRemove { zone } => {
                let Some(position) = session.position_of(&zone) else {
                    warn!(zone = zone.name(), "removal of unregistered zone ignored");
                    return false;
                };
                session.zones.remove(position);
                session.rebuild_names();
                info!(zone = zone.name(), "zone unregistered");
                if self.active.compare_and_clear(&zone) {
                    self.release(session, &zone);
                    info!(zone = zone.name(), "debug session ended, zone removed");
                }
                self.transport.broadcast(&broadcast::names(&session.names));
                false
            }
            Event::SetDebug { zone_name } => {
                self.set_debug(session, &zone_name);
                false
            }
            Event::Selection { character_id } => self.apply_selection(session, character_id),
            Event::Step { step_millis } => {
                if !session.paused {
                    warn!(step_millis, "step ignored, simulation is not paused");
                    return false;
                }
                let Some(zone) = self.active.load() else {
                    return false;
                };
                zone.execute_parallel(|agent| {
                    agent.step(step_millis);
                });
                debug!(zone = zone.name(), step_millis, "stepped paused zone");
                self.broadcast_state(session);
                true
            }
            Event::Reset { zone } => {
                zone.execute_parallel(arbor_zone::Agent::reset_state);
                info!(zone = zone.name(), "zone run state reset");
                if self.active.is(&zone) {
                    self.broadcast_state(session);
                    true
                } else {
                    false
                }
            }
            Event::Pause { paused } => {
                if let Some(zone) = self.active.load() {
                    zone.execute_parallel(|agent| agent.set_paused(paused));
                }
                session.paused = paused;
                info!(paused, "pause state changed");
                self.transport.broadcast(&broadcast::pause(paused));
                if paused {
                    self.broadcast_state(session);
                }
                paused
            }
            Event::UpdateStaticDetails { zone } => {
                if self.active.is(&zone) {
                    self.broadcast_static(session, &zone);
                }
                false
            }
        }
    }

    fn set_debug(&self, session: &mut SessionState, zone_name: &str) {
        if let Some(previous) = self.active.store(None) {
            self.release(session, &previous);
        } else if session.paused {
            session.paused = false;
            self.transport.broadcast(&broadcast::pause(false));
        }
        session.selected = None;

        match session.find_zone(zone_name) {
            Some(zone) => {
                zone.set_debug(true);
                info!(zone = zone.name(), agents = zone.len(), "debug session started");
                self.active.store(Some(zone));
            }
            None => warn!(zone = zone_name, "no registered zone with this name"),
        }
    }

    /// Undo everything a debug session did to `zone`. The caller has
    /// already taken `zone` out of the active slot.
    fn release(&self, session: &mut SessionState, zone: &Zone) {
        zone.set_debug(false);
        if session.paused {
            zone.execute_parallel(|agent| agent.set_paused(false));
            session.paused = false;
            self.transport.broadcast(&broadcast::pause(false));
        }
        session.selected = None;
    }

    fn apply_selection(&self, session: &mut SessionState, character_id: Option<CharacterId>) -> bool {
        let Some(zone) = self.active.load() else {
            warn!(?character_id, "selection ignored, no zone under debug");
            session.selected = None;
            return false;
        };
        let Some(id) = character_id else {
            session.selected = None;
            debug!("selection cleared");
            return false;
        };
        if zone.get_ai(id).is_none() {
            warn!(character_id = %id, zone = zone.name(), "selected agent not in zone");
            session.selected = None;
            return false;
        }
        session.selected = Some(id);
        debug!(character_id = %id, "agent selected");
        self.broadcast_static(session, &zone);
        self.broadcast_state(session);
        true
    }

    fn heartbeat(&self, session: &mut SessionState, broadcasted: bool) {
        let zone = self.active.load();
        if let (Some(zone), Some(id)) = (&zone, session.selected)
            && zone.get_ai(id).is_none()
        {
            session.selected = None;
            debug!(error = %DebugError::StaleSelection(id), "selection dropped");
        }
        if session.clients.is_empty() || zone.is_none() {
            if session.paused {
                if let Some(zone) = &zone {
                    zone.execute_parallel(|agent| agent.set_paused(false));
                }
                session.paused = false;
                session.selected = None;
                self.transport.broadcast(&broadcast::pause(false));
                info!("pause released, nobody is debugging");
            }
            if zone.is_none() {
                session.selected = None;
            }
            return;
        }
        if !session.paused && !broadcasted {
            self.broadcast_state(session);
        }
    }

    /// Broadcast the world state of the zone under debug plus the live
    /// details of the selected agent.
    fn broadcast_state(&self, session: &mut SessionState) {
        let Some(zone) = self.active.load() else {
            return;
        };
        self.transport.broadcast(&broadcast::world_state(&zone));
        match Self::selected_message(session, &zone, broadcast::character_details) {
            Ok(Some(message)) => self.transport.broadcast(&message),
            Ok(None) => {}
            Err(error) => debug!(%error, "selection dropped"),
        }
    }

    fn broadcast_static(&self, session: &mut SessionState, zone: &Zone) {
        match Self::selected_message(session, zone, broadcast::character_static) {
            Ok(Some(message)) => self.transport.broadcast(&message),
            Ok(None) => {}
            Err(error) => debug!(%error, "selection dropped"),
        }
    }

    /// Build a message for the selected agent. A vanished agent clears the
    /// selection and reports [`DebugError::StaleSelection`].
    fn selected_message(
        session: &mut SessionState,
        zone: &Zone,
        build: fn(&arbor_zone::Agent) -> ServerMessage,
    ) -> Result<Option<ServerMessage>, DebugError> {
        let Some(id) = session.selected else {
            return Ok(None);
        };
        zone.execute_on(id, build).map(Some).ok_or_else(|| {
            session.selected = None;
            DebugError::StaleSelection(id)
        })
    }
}
