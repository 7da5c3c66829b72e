//! Debug events carried from command callers to the tick thread.

use std::fmt;
use std::sync::Arc;

use arbor_types::{CharacterId, ClientId};
use arbor_zone::Zone;

/// One queued debugger command. Immutable once enqueued.
#[derive(Clone)]
pub enum Event {
    /// A debugger client connected.
    NewConnection {
        /// The new client.
        client: ClientId,
    },
    /// A debugger client disconnected.
    Disconnect {
        /// The departed client.
        client: ClientId,
        /// The zone under debug when the client left. Released only if it
        /// is still the zone under debug when the event is applied.
        seen_zone: Option<Arc<Zone>>,
    },
    /// The simulation registered a zone.
    ZoneAdd {
        /// The zone.
        zone: Arc<Zone>,
    },
    /// The simulation unregistered a zone.
    ZoneRemove {
        /// The zone.
        zone: Arc<Zone>,
    },
    /// Switch the zone under debug.
    SetDebug {
        /// Name of the zone to debug.
        zone_name: String,
    },
    /// Select an agent for detail broadcasts, or clear the selection.
    Selection {
        /// The agent, `None` to clear.
        character_id: Option<CharacterId>,
    },
    /// Advance one manual tick while paused.
    Step {
        /// Tick length in milliseconds.
        step_millis: i64,
    },
    /// Reset every agent's run state in a zone.
    Reset {
        /// The zone to reset.
        zone: Arc<Zone>,
    },
    /// Set or clear the global pause.
    Pause {
        /// Requested pause state.
        paused: bool,
    },
    /// Rebroadcast the static tree of the selected agent.
    UpdateStaticDetails {
        /// The zone whose tree changed.
        zone: Arc<Zone>,
    },
}

impl Event {
    /// Short name of the event kind, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewConnection { .. } => "new_connection",
            Self::Disconnect { .. } => "disconnect",
            Self::ZoneAdd { .. } => "zone_add",
            Self::ZoneRemove { .. } => "zone_remove",
            Self::SetDebug { .. } => "set_debug",
            Self::Selection { .. } => "selection",
            Self::Step { .. } => "step",
            Self::Reset { .. } => "reset",
            Self::Pause { .. } => "pause",
            Self::UpdateStaticDetails { .. } => "update_static_details",
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewConnection { client } => write!(f, "NewConnection({client})"),
            Self::Disconnect { client, seen_zone } => write!(
                f,
                "Disconnect({client}, seen={:?})",
                seen_zone.as_ref().map(|z| z.name())
            ),
            Self::ZoneAdd { zone } => write!(f, "ZoneAdd({})", zone.name()),
            Self::ZoneRemove { zone } => write!(f, "ZoneRemove({})", zone.name()),
            Self::SetDebug { zone_name } => write!(f, "SetDebug({zone_name})"),
            Self::Selection { character_id } => write!(f, "Selection({character_id:?})"),
            Self::Step { step_millis } => write!(f, "Step({step_millis})"),
            Self::Reset { zone } => write!(f, "Reset({})", zone.name()),
            Self::Pause { paused } => write!(f, "Pause({paused})"),
            Self::UpdateStaticDetails { zone } => write!(f, "UpdateStaticDetails({})", zone.name()),
        }
    }
}
