//! Session state: what the debugger is watching.
//!
//! [`SessionState`] is owned by the [`DebugServer`](crate::DebugServer) and
//! only touched on the tick thread. The zone under debug lives apart from it
//! in [`ActiveZone`], a swappable pointer that network code may read at any
//! time but only the tick thread replaces.

use std::collections::BTreeSet;
use std::sync::Arc;

use arbor_types::{CharacterId, ClientId};
use arbor_zone::Zone;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// The zone currently under debug, if any.
#[derive(Debug, Default)]
pub struct ActiveZone {
    zone: RwLock<Option<Arc<Zone>>>,
}

impl ActiveZone {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The zone under debug.
    pub fn load(&self) -> Option<Arc<Zone>> {
        self.zone.read().clone()
    }

    /// Name of the zone under debug.
    pub fn name(&self) -> Option<String> {
        self.zone.read().as_ref().map(|z| z.name().to_owned())
    }

    /// Whether `zone` is the zone under debug.
    pub fn is(&self, zone: &Arc<Zone>) -> bool {
        self.zone
            .read()
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, zone))
    }

    /// Replace the zone under debug, returning the previous one.
    pub(crate) fn store(&self, zone: Option<Arc<Zone>>) -> Option<Arc<Zone>> {
        std::mem::replace(&mut *self.zone.write(), zone)
    }

    /// Clear the slot only if it still holds `expected`. Returns whether it
    /// was cleared.
    pub(crate) fn compare_and_clear(&self, expected: &Arc<Zone>) -> bool {
        let mut slot = self.zone.write();
        if slot.as_ref().is_some_and(|active| Arc::ptr_eq(active, expected)) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Where the debugger is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugState {
    /// No zone under debug.
    Idle,
    /// A zone is under debug, no agent selected.
    ZoneDebugging,
    /// A zone is under debug and one of its agents is selected.
    AgentSelected,
}

/// Mutable session data, owned by the tick thread.
#[derive(Debug)]
pub struct SessionState {
    pub(crate) zones: Vec<Arc<Zone>>,
    pub(crate) names: Vec<String>,
    pub(crate) selected: Option<CharacterId>,
    pub(crate) paused: bool,
    pub(crate) clients: BTreeSet<ClientId>,
    pub(crate) time_millis: i64,
    pub(crate) started_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh state: no zones, no clients, unpaused, clock at zero.
    pub fn new() -> Self {
        Self {
            zones: Vec::new(),
            names: Vec::new(),
            selected: None,
            paused: false,
            clients: BTreeSet::new(),
            time_millis: 0,
            started_at: Utc::now(),
        }
    }

    /// Registered zones in registration order.
    pub fn zones(&self) -> &[Arc<Zone>] {
        &self.zones
    }

    /// Registered zone names in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The selected agent.
    pub const fn selected(&self) -> Option<CharacterId> {
        self.selected
    }

    /// Whether the global pause is set.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Connected debugger clients.
    pub const fn clients(&self) -> &BTreeSet<ClientId> {
        &self.clients
    }

    /// Simulation clock in milliseconds.
    pub const fn time_millis(&self) -> i64 {
        self.time_millis
    }

    /// Lifecycle state given the zone under debug.
    pub const fn debug_state(&self, active: Option<&Arc<Zone>>) -> DebugState {
        match (active, self.selected) {
            (None, _) => DebugState::Idle,
            (Some(_), None) => DebugState::ZoneDebugging,
            (Some(_), Some(_)) => DebugState::AgentSelected,
        }
    }

    pub(crate) fn find_zone(&self, name: &str) -> Option<Arc<Zone>> {
        self.zones.iter().find(|z| z.name() == name).cloned()
    }

    pub(crate) fn position_of(&self, zone: &Arc<Zone>) -> Option<usize> {
        self.zones.iter().position(|z| Arc::ptr_eq(z, zone))
    }

    pub(crate) fn rebuild_names(&mut self) {
        self.names = self.zones.iter().map(|z| z.name().to_owned()).collect();
    }

    pub(crate) fn advance(&mut self, delta_millis: i64) {
        self.time_millis = self.time_millis.saturating_add(delta_millis);
    }

    pub(crate) fn summary(&self, active: Option<&Arc<Zone>>) -> SessionSummary {
        SessionSummary {
            state: self.debug_state(active),
            zone: active.map(|z| z.name().to_owned()),
            selected: self.selected,
            paused: self.paused,
            clients: self.clients.len(),
            time_millis: self.time_millis,
            zones: self.names.clone(),
            started_at: self.started_at,
        }
    }
}

/// Immutable snapshot of the session, published after every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Lifecycle state.
    pub state: DebugState,
    /// Name of the zone under debug.
    pub zone: Option<String>,
    /// The selected agent.
    pub selected: Option<CharacterId>,
    /// Whether the global pause is set.
    pub paused: bool,
    /// Number of connected debugger clients.
    pub clients: usize,
    /// Simulation clock in milliseconds.
    pub time_millis: i64,
    /// Registered zone names.
    pub zones: Vec<String>,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl Default for SessionSummary {
    fn default() -> Self {
        SessionState::new().summary(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn compare_and_clear_only_clears_matching_zone() {
        let alpha = Arc::new(Zone::new("alpha"));
        let beta = Arc::new(Zone::new("beta"));
        let active = ActiveZone::new();

        assert!(active.store(Some(Arc::clone(&alpha))).is_none());
        assert!(!active.compare_and_clear(&beta));
        assert!(active.is(&alpha));

        assert!(active.compare_and_clear(&alpha));
        assert!(active.load().is_none());
        assert!(!active.compare_and_clear(&alpha));
    }

    #[test]
    fn same_name_different_zone_is_not_active() {
        let first = Arc::new(Zone::new("alpha"));
        let second = Arc::new(Zone::new("alpha"));
        let active = ActiveZone::new();
        active.store(Some(first));
        assert!(!active.is(&second));
        assert_eq!(active.name().as_deref(), Some("alpha"));
    }

    #[test]
    fn debug_state_follows_zone_and_selection() {
        let zone = Arc::new(Zone::new("alpha"));
        let mut state = SessionState::new();
        assert_eq!(state.debug_state(None), DebugState::Idle);
        assert_eq!(state.debug_state(Some(&zone)), DebugState::ZoneDebugging);
        state.selected = Some(CharacterId::new(2));
        assert_eq!(state.debug_state(Some(&zone)), DebugState::AgentSelected);
        assert_eq!(state.debug_state(None), DebugState::Idle);
    }

    #[test]
    fn summary_serializes_flat_snake_case() {
        let zone = Arc::new(Zone::new("alpha"));
        let mut state = SessionState::new();
        state.names = vec![String::from("alpha")];
        state.selected = Some(CharacterId::new(3));
        state.paused = true;
        state.advance(250);

        let json = serde_json::to_value(state.summary(Some(&zone))).unwrap();
        assert_eq!(json["state"], "agent_selected");
        assert_eq!(json["zone"], "alpha");
        assert_eq!(json["selected"], 3);
        assert_eq!(json["paused"], true);
        assert_eq!(json["clients"], 0);
        assert_eq!(json["time_millis"], 250);
        assert_eq!(json["zones"], serde_json::json!(["alpha"]));
        assert!(json["started_at"].is_string());
    }
}
