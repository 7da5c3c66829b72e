//! Builds outbound snapshot messages from zones and agents.
//!
//! Everything here reads through shared references. In particular the
//! detail snapshot reads the agent's [`RunState`] without touching it, so
//! observing an agent never changes what it does next.

use arbor_tree::{RunState, TreeNode};
use arbor_types::{AgentStateWorld, ServerMessage, StateNode, StateNodeStatic, TreeNodeStatus};
use arbor_zone::{Agent, Zone};

/// The registered zone names.
pub fn names(names: &[String]) -> ServerMessage {
    ServerMessage::Names {
        names: names.to_vec(),
    }
}

/// The global pause state.
pub const fn pause(paused: bool) -> ServerMessage {
    ServerMessage::Pause { paused }
}

/// World state of every agent in `zone`.
pub fn world_state(zone: &Zone) -> ServerMessage {
    let mut states = Vec::with_capacity(zone.len());
    zone.execute(|agent| {
        let character = agent.character();
        states.push(AgentStateWorld {
            character_id: character.id,
            position: character.position,
            orientation: character.orientation,
            attributes: character.attributes.clone(),
        });
    });
    ServerMessage::State { states }
}

/// Static structure of the agent's tree, flattened in pre-order.
pub fn character_static(agent: &Agent) -> ServerMessage {
    let mut nodes = Vec::with_capacity(agent.behaviour().len());
    agent.behaviour().root().walk(&mut |node| {
        let (condition_name, condition_parameters) = node
            .condition()
            .map(|c| (c.name().to_owned(), c.parameters().to_owned()))
            .unwrap_or_default();
        nodes.push(StateNodeStatic {
            node_id: node.id(),
            name: node.name().to_owned(),
            node_type: node.node_type().to_owned(),
            parameters: node.parameters().to_owned(),
            condition_name,
            condition_parameters,
        });
    });
    ServerMessage::CharacterStatic {
        character_id: agent.id(),
        nodes,
    }
}

/// Live execution state of the agent's tree plus its aggro table.
pub fn character_details(agent: &Agent) -> ServerMessage {
    let run_state = agent.run_state();
    let root = agent.behaviour().root();
    let running = run_state.last_status(root.id()) == TreeNodeStatus::Running;
    ServerMessage::CharacterDetails {
        character_id: agent.id(),
        aggro: agent.aggro().entries().to_vec(),
        root: state_node(root, run_state, agent.time_millis(), running),
    }
}

fn state_node(node: &TreeNode, run_state: &RunState, now: i64, running: bool) -> StateNode {
    let last_exec = run_state.last_exec_millis(node.id());
    let last_run_millis = if last_exec < 0 {
        -1
    } else {
        now.saturating_sub(last_exec)
    };
    let condition = run_state
        .condition_description(node.id())
        .map(str::to_owned)
        .or_else(|| node.condition().map(|c| c.describe()))
        .unwrap_or_default();
    let children = node
        .children()
        .iter()
        .zip(run_state.running_children(node))
        .map(|(child, child_running)| state_node(child, run_state, now, child_running))
        .collect();

    StateNode {
        node_id: node.id(),
        condition,
        last_run_millis,
        status: run_state.last_status(node.id()),
        running,
        children,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use arbor_tree::{AiRegistry, BehaviorTree};
    use arbor_types::{Character, CharacterId, NodeId, Vec3};

    use super::*;

    fn agent() -> Agent {
        let registry = AiRegistry::default();
        let mut root = registry
            .parse_node("PrioritySelector", "root", NodeId::new(1))
            .unwrap();
        root.add_child(
            registry
                .parse_node("Idle{500}", "wait", NodeId::new(2))
                .unwrap()
                .with_condition(registry.parse_condition("Not(False)").unwrap()),
        )
        .unwrap();
        root.add_child(registry.parse_node("Succeed", "done", NodeId::new(3)).unwrap())
            .unwrap();
        let mut character = Character::new(CharacterId::new(4), Vec3::new(1.0, 0.0, 2.0));
        character.attributes.insert(String::from("faction"), String::from("wolves"));
        Agent::new(character, BehaviorTree::new(root), 3)
    }

    #[test]
    fn static_snapshot_is_preorder() {
        let ServerMessage::CharacterStatic { character_id, nodes } = character_static(&agent()) else {
            panic!("expected a static snapshot");
        };
        assert_eq!(character_id, CharacterId::new(4));
        let ids: Vec<u32> = nodes.iter().map(|n| n.node_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let wait = nodes.get(1).unwrap();
        assert_eq!(wait.node_type, "Idle");
        assert_eq!(wait.parameters, "500");
        assert_eq!(wait.condition_name, "Not");
        assert_eq!(nodes.first().unwrap().condition_name, "");
    }

    #[test]
    fn details_before_first_tick() {
        let ServerMessage::CharacterDetails { root, aggro, .. } = character_details(&agent()) else {
            panic!("expected a detail snapshot");
        };
        assert!(aggro.is_empty());
        assert_eq!(root.last_run_millis, -1);
        assert_eq!(root.status, TreeNodeStatus::Unknown);
        let wait = root.children.first().unwrap();
        assert_eq!(wait.condition, "Not(False)");
        assert!(!wait.running);
    }

    #[test]
    fn details_after_ticks() {
        let mut agent = agent();
        agent.tick(100);
        agent.tick(100);
        let before = agent.run_state().clone();

        let ServerMessage::CharacterDetails { root, .. } = character_details(&agent) else {
            panic!("expected a detail snapshot");
        };
        assert_eq!(agent.run_state(), &before);
        assert_eq!(root.status, TreeNodeStatus::Running);
        assert!(root.running);
        assert_eq!(root.last_run_millis, 0);

        let wait = root.children.first().unwrap();
        assert_eq!(wait.status, TreeNodeStatus::Running);
        assert!(wait.running);
        assert_eq!(wait.condition, "Not(False[0])[1]");

        let done = root.children.get(1).unwrap();
        assert_eq!(done.last_run_millis, -1);
        assert!(!done.running);
    }

    #[test]
    fn world_state_lists_every_agent() {
        let zone = Zone::new("alpha");
        zone.add_agent(agent()).unwrap();
        let ServerMessage::State { states } = world_state(&zone) else {
            panic!("expected a world state");
        };
        assert_eq!(states.len(), 1);
        let state = states.first().unwrap();
        assert_eq!(state.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(state.attributes.get("faction").map(String::as_str), Some("wolves"));
    }
}
