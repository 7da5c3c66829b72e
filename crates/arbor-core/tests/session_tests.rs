//! End-to-end debug session scenarios driven through the public API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use arbor_core::{
    DebugServer, DebugState, ErrorKind, RecordingTransport, SessionSummary, TreeConfig,
};
use arbor_tree::AiRegistry;
use arbor_types::{CharacterId, ClientId, NodeId, ServerMessage, Vec3};
use arbor_zone::{Agent, Zone};
use proptest::prelude::*;

const TICK: i64 = 100;

fn node(name: &str, node_type: &str, children: Vec<TreeConfig>) -> TreeConfig {
    TreeConfig {
        name: name.to_owned(),
        node_type: node_type.to_owned(),
        condition: None,
        children,
    }
}

/// Seven nodes, numbered in pre-order:
/// 1 PrioritySelector [2 Sequence [3 Idle, 4 Wander], 5 Sequence [6 Idle, 7 Succeed]]
fn behaviour() -> TreeConfig {
    node(
        "root",
        "PrioritySelector",
        vec![
            node(
                "patrol",
                "Sequence",
                vec![node("look", "Idle{200}", vec![]), node("walk", "Wander", vec![])],
            ),
            node(
                "rest",
                "Sequence",
                vec![node("sit", "Idle{500}", vec![]), node("done", "Succeed", vec![])],
            ),
        ],
    )
}

fn zone(name: &str, agents: u32) -> Arc<Zone> {
    let registry = AiRegistry::default();
    let zone = Zone::new(name);
    for id in 1..=agents {
        let character = arbor_types::Character::new(CharacterId::new(id), Vec3::default());
        let tree = behaviour().build(&registry).unwrap();
        zone.add_agent(Agent::new(character, tree, u64::from(id))).unwrap();
    }
    Arc::new(zone)
}

struct Harness {
    transport: Arc<RecordingTransport>,
    server: DebugServer,
    alpha: Arc<Zone>,
    beta: Arc<Zone>,
    client: ClientId,
}

impl Harness {
    /// Two registered zones and one connected client, nothing debugged yet.
    fn new() -> Self {
        let transport = Arc::new(RecordingTransport::new());
        let server = DebugServer::new(AiRegistry::default(), transport.clone());
        let alpha = zone("alpha", 3);
        let beta = zone("beta", 2);
        let client = ClientId::new();
        server.register_zone(Arc::clone(&alpha));
        server.register_zone(Arc::clone(&beta));
        server.on_client_connect(client);
        server.update(TICK);
        Self {
            transport,
            server,
            alpha,
            beta,
            client,
        }
    }

    /// Same as [`Harness::new`] with "alpha" under debug.
    fn debugging() -> Self {
        let h = Self::new();
        h.server.set_debug_zone("alpha");
        h.server.update(TICK);
        h
    }

    fn tick(&self) -> SessionSummary {
        self.server.update(TICK);
        (*self.server.summary()).clone()
    }

    fn tree_of(&self, id: u32) -> arbor_tree::BehaviorTree {
        let handle = self.alpha.get_ai(CharacterId::new(id)).unwrap();
        let tree = handle.lock().behaviour().clone();
        tree
    }

    fn agent_times(&self, zone: &Zone) -> Vec<i64> {
        let mut times = Vec::new();
        zone.execute(|a| times.push(a.time_millis()));
        times
    }
}

#[test]
fn new_connection_receives_pause_and_names() {
    let h = Harness::new();
    let sent = h.transport.sent_to(h.client);
    assert_eq!(
        sent,
        vec![
            ServerMessage::Pause { paused: false },
            ServerMessage::Names {
                names: vec![String::from("alpha"), String::from("beta")],
            },
        ]
    );
    let summary = h.tick();
    assert_eq!(summary.clients, 1);
    assert_eq!(summary.zones, vec![String::from("alpha"), String::from("beta")]);
    assert_eq!(summary.state, DebugState::Idle);
}

#[test]
fn select_then_last_client_leaves() {
    let h = Harness::new();

    h.server.set_debug_zone("alpha");
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::ZoneDebugging);
    assert_eq!(summary.zone.as_deref(), Some("alpha"));
    assert!(h.alpha.is_debug());
    assert!(!h.beta.is_debug());

    h.server.select(Some(CharacterId::new(2)));
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::AgentSelected);
    assert_eq!(summary.selected, Some(CharacterId::new(2)));

    h.server.on_client_disconnect(h.client);
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::Idle);
    assert_eq!(summary.selected, None);
    assert_eq!(summary.clients, 0);
    assert!(!h.alpha.is_debug());
    assert!(h.server.active_zone().is_none());
}

#[test]
fn add_node_appends_and_rebroadcasts_structure() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(2)));
    h.tick();
    h.transport.take();

    let id = h
        .server
        .add_node(CharacterId::new(2), NodeId::new(1), "Wander", "Wander", "True")
        .unwrap();
    assert_eq!(id, NodeId::new(8));

    let tree = h.tree_of(2);
    assert_eq!(tree.root().children().len(), 3);
    let added = tree.root().children().last().unwrap();
    assert_eq!(added.name(), "Wander");
    assert_eq!(added.id(), NodeId::new(8));
    assert_eq!(added.condition().unwrap().name(), "True");

    // Other agents are untouched.
    assert_eq!(h.tree_of(1).len(), 7);

    h.tick();
    let statics: Vec<_> = h
        .transport
        .broadcasts()
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::CharacterStatic { character_id, nodes } => Some((character_id, nodes.len())),
            _ => None,
        })
        .collect();
    assert_eq!(statics, vec![(CharacterId::new(2), 8)]);
}

#[test]
fn update_node_with_bad_type_changes_nothing() {
    let h = Harness::debugging();
    let before = h.tree_of(2);

    let err = h
        .server
        .update_node(CharacterId::new(2), NodeId::new(7), "X", "BadType", "True")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(h.tree_of(2), before);

    let err = h
        .server
        .update_node(CharacterId::new(2), NodeId::new(7), "X", "Succeed", "Not(")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(h.tree_of(2), before);
    assert_eq!(h.server.pending_events(), 0);
}

#[test]
fn update_node_keeps_id_and_children() {
    let h = Harness::debugging();
    h.server
        .update_node(CharacterId::new(2), NodeId::new(5), "resting", "Parallel", "HasEnemies{2}")
        .unwrap();

    let tree = h.tree_of(2);
    assert_eq!(tree.len(), 7);
    let updated = tree.get_child(NodeId::new(5)).unwrap();
    assert_eq!(updated.name(), "resting");
    assert_eq!(updated.node_type(), "Parallel");
    let children: Vec<NodeId> = updated.children().iter().map(|c| c.id()).collect();
    assert_eq!(children, vec![NodeId::new(6), NodeId::new(7)]);
    assert_eq!(tree.get_parent(NodeId::new(5)).unwrap().id(), NodeId::new(1));
}

#[test]
fn update_node_rejects_type_that_cannot_hold_children() {
    let h = Harness::debugging();
    let before = h.tree_of(1);
    let err = h
        .server
        .update_node(CharacterId::new(1), NodeId::new(2), "x", "Idle", "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(h.tree_of(1), before);
}

#[test]
fn update_root_replaces_whole_root() {
    let h = Harness::debugging();
    h.server
        .update_node(CharacterId::new(3), NodeId::new(1), "top", "Sequence", "")
        .unwrap();
    let tree = h.tree_of(3);
    assert_eq!(tree.root().id(), NodeId::new(1));
    assert_eq!(tree.root().node_type(), "Sequence");
    assert_eq!(tree.root().children().len(), 2);
}

#[test]
fn delete_root_is_refused() {
    let h = Harness::debugging();
    let before = h.tree_of(2);
    let err = h
        .server
        .delete_node(CharacterId::new(2), NodeId::new(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(h.tree_of(2), before);
}

#[test]
fn delete_removes_subtree() {
    let h = Harness::debugging();
    h.server.delete_node(CharacterId::new(2), NodeId::new(2)).unwrap();
    let tree = h.tree_of(2);
    assert_eq!(tree.len(), 4);
    assert!(!tree.contains(NodeId::new(3)));
    assert!(!tree.contains(NodeId::new(4)));

    let err = h
        .server
        .delete_node(CharacterId::new(2), NodeId::new(3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn edits_need_zone_and_agent() {
    let h = Harness::new();
    let err = h
        .server
        .add_node(CharacterId::new(2), NodeId::new(1), "w", "Wander", "True")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    h.server.set_debug_zone("alpha");
    h.tick();
    let err = h
        .server
        .add_node(CharacterId::new(42), NodeId::new(1), "w", "Wander", "True")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .server
        .add_node(CharacterId::new(2), NodeId::new(99), "w", "Wander", "True")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .server
        .add_node(CharacterId::new(2), NodeId::new(3), "w", "Wander", "True")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

#[test]
fn pause_and_step() {
    let h = Harness::debugging();
    h.transport.take();

    h.server.pause(true);
    let summary = h.tick();
    assert!(summary.paused);
    h.alpha.execute(|a| assert!(a.is_paused()));
    h.beta.execute(|a| assert!(!a.is_paused()));
    let broadcasts = h.transport.broadcasts();
    assert_eq!(broadcasts.first(), Some(&ServerMessage::Pause { paused: true }));
    assert!(broadcasts.iter().any(|m| matches!(m, ServerMessage::State { .. })));

    let before = h.agent_times(&h.alpha);
    h.alpha.update(TICK);
    assert_eq!(h.agent_times(&h.alpha), before);

    h.server.step(50);
    h.tick();
    let after: Vec<i64> = before.iter().map(|t| t + 50).collect();
    assert_eq!(h.agent_times(&h.alpha), after);
    h.alpha.execute(|a| assert!(a.is_paused()));
    assert!(h.server.summary().paused);

    h.server.pause(false);
    let summary = h.tick();
    assert!(!summary.paused);
    h.alpha.execute(|a| assert!(!a.is_paused()));
}

#[test]
fn step_while_running_is_a_no_op() {
    let h = Harness::debugging();
    let before = h.agent_times(&h.alpha);
    h.server.step(50);
    h.tick();
    assert_eq!(h.agent_times(&h.alpha), before);
    h.alpha.execute(|a| assert!(!a.is_paused()));
}

#[test]
fn switching_zone_while_paused_unpauses() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(1)));
    h.server.pause(true);
    h.tick();

    h.server.set_debug_zone("beta");
    let summary = h.tick();
    assert!(!summary.paused);
    assert_eq!(summary.state, DebugState::ZoneDebugging);
    assert_eq!(summary.zone.as_deref(), Some("beta"));
    assert!(!h.alpha.is_debug());
    assert!(h.beta.is_debug());
    h.alpha.execute(|a| assert!(!a.is_paused()));
}

#[test]
fn unknown_zone_name_ends_debugging() {
    let h = Harness::debugging();
    h.server.set_debug_zone("nowhere");
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::Idle);
    assert!(!h.alpha.is_debug());
}

#[test]
fn removing_active_zone_clears_selection() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(3)));
    h.tick();

    h.server.unregister_zone(Arc::clone(&h.alpha));
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::Idle);
    assert_eq!(summary.selected, None);
    assert_eq!(summary.zones, vec![String::from("beta")]);
    assert!(!h.alpha.is_debug());
}

#[test]
fn duplicate_and_unknown_zone_events_do_not_abort_the_batch() {
    let h = Harness::new();
    let gamma = zone("gamma", 1);
    h.server.register_zone(Arc::clone(&h.alpha));
    h.server.unregister_zone(Arc::clone(&gamma));
    h.server.register_zone(Arc::clone(&gamma));
    h.server.set_debug_zone("gamma");
    let summary = h.tick();
    assert_eq!(
        summary.zones,
        vec![String::from("alpha"), String::from("beta"), String::from("gamma")]
    );
    assert_eq!(summary.zone.as_deref(), Some("gamma"));
    assert!(gamma.is_debug());
}

#[test]
fn disconnect_only_releases_the_zone_it_saw() {
    let h = Harness::debugging();
    h.server.set_debug_zone("beta");
    h.server.on_client_disconnect(h.client);
    let summary = h.tick();

    assert_eq!(summary.clients, 0);
    assert_eq!(summary.zone.as_deref(), Some("beta"));
    assert!(h.beta.is_debug());
    assert!(!h.alpha.is_debug());
}

#[test]
fn vanished_agent_clears_selection() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(2)));
    assert_eq!(h.tick().state, DebugState::AgentSelected);

    h.alpha.remove_agent(CharacterId::new(2));
    let summary = h.tick();
    assert_eq!(summary.state, DebugState::ZoneDebugging);
    assert_eq!(summary.selected, None);
}

#[test]
fn vanished_agent_clears_selection_while_paused() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(2)));
    h.server.pause(true);
    assert_eq!(h.tick().state, DebugState::AgentSelected);

    h.alpha.remove_agent(CharacterId::new(2));
    h.transport.take();
    let summary = h.tick();
    assert!(summary.paused);
    assert_eq!(summary.selected, None);
    assert!(h.transport.broadcasts().is_empty());
}

#[test]
fn selecting_unknown_agent_is_ignored() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(9)));
    assert_eq!(h.tick().state, DebugState::ZoneDebugging);

    let h = Harness::new();
    h.server.select(Some(CharacterId::new(1)));
    assert_eq!(h.tick().state, DebugState::Idle);
}

#[test]
fn heartbeat_broadcasts_state_and_details() {
    let h = Harness::debugging();
    h.server.select(Some(CharacterId::new(1)));
    h.tick();
    h.transport.take();

    h.tick();
    let broadcasts = h.transport.broadcasts();
    assert!(matches!(broadcasts.first(), Some(ServerMessage::State { states }) if states.len() == 3));
    assert!(matches!(
        broadcasts.get(1),
        Some(ServerMessage::CharacterDetails { character_id, .. }) if *character_id == CharacterId::new(1)
    ));
}

#[test]
fn no_heartbeat_while_paused() {
    let h = Harness::debugging();
    h.server.pause(true);
    h.tick();
    h.transport.take();
    h.tick();
    assert!(h.transport.broadcasts().is_empty());
}

#[test]
fn pause_without_debugger_is_released() {
    let transport = Arc::new(RecordingTransport::new());
    let server = DebugServer::new(AiRegistry::default(), transport);
    server.pause(true);
    server.update(TICK);
    assert!(!server.summary().paused);
}

#[test]
fn reset_clears_run_state() {
    let h = Harness::debugging();
    h.alpha.update(TICK);
    h.alpha.execute(|a| assert!(!a.run_state().is_empty()));

    assert!(h.server.reset());
    h.tick();
    h.alpha.execute(|a| assert!(a.run_state().is_empty()));
    h.beta.execute(|a| assert!(a.run_state().is_empty()));

    let idle = Harness::new();
    assert!(!idle.server.reset());
}

#[test]
fn clock_advances_every_tick() {
    let h = Harness::new();
    let first = h.tick().time_millis;
    let second = h.tick().time_millis;
    assert_eq!(second - first, TICK);
}

proptest! {
    #[test]
    fn at_most_one_zone_is_debugged(
        script in proptest::collection::vec((0..5_usize, any::<bool>()), 1..24),
    ) {
        let names = ["alpha", "beta", "gamma", "nowhere", "alpha"];
        let h = Harness::new();
        let gamma = zone("gamma", 1);
        h.server.register_zone(Arc::clone(&gamma));
        h.server.update(TICK);
        let zones = [&h.alpha, &h.beta, &gamma];

        for (pick, flush) in script {
            h.server.set_debug_zone(*names.get(pick).unwrap());
            if flush {
                h.server.update(TICK);
                let debugged: Vec<&Arc<Zone>> = zones.iter().copied().filter(|z| z.is_debug()).collect();
                prop_assert!(debugged.len() <= 1);
                match h.server.active_zone() {
                    Some(active) => {
                        prop_assert_eq!(debugged.len(), 1);
                        let first: &Arc<Zone> = debugged.first().copied().unwrap();
                        prop_assert!(Arc::ptr_eq(first, &active));
                    }
                    None => prop_assert!(debugged.is_empty()),
                }
            }
        }
    }
}
