//! Execution of behavior trees against one agent.
//!
//! [`TreeNode::execute`] evaluates the node's condition, runs the node's
//! kind, and records the outcome in the agent's [`RunState`]. The tree is
//! only borrowed immutably; all per-agent mutation goes through the
//! [`ExecContext`].

use arbor_types::{AggroEntry, Character, TreeNodeStatus};
use rand::Rng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::node::{NodeKind, TreeNode};
use crate::state::RunState;

/// Everything a tree may read or change while executing for one agent.
pub struct ExecContext<'a> {
    /// The character the agent drives.
    pub character: &'a mut Character,
    /// Aggro entries, highest first.
    pub aggro: &'a [AggroEntry],
    /// The agent's run state.
    pub run_state: &'a mut RunState,
    /// The agent's random source.
    pub rng: &'a mut StdRng,
    /// Agent time in milliseconds.
    pub time_millis: i64,
}

impl TreeNode {
    /// Execute this node (and, depending on its kind, its children) once.
    pub fn execute(&self, ctx: &mut ExecContext<'_>, delta_millis: i64) -> TreeNodeStatus {
        if let Some(condition) = self.condition() {
            let mut description = String::new();
            let allowed = condition.evaluate(ctx, &mut description);
            ctx.run_state.entry(self.id()).condition = Some(description);
            if !allowed {
                return self.record(ctx, TreeNodeStatus::CannotExecute);
            }
        }

        let status = match self.kind() {
            NodeKind::Sequence => self.run_sequence(ctx, delta_millis),
            NodeKind::PrioritySelector => {
                let order: Vec<usize> = (0..self.children().len()).collect();
                self.run_selector(ctx, delta_millis, &order)
            }
            NodeKind::RandomSelector => {
                let mut order: Vec<usize> = (0..self.children().len()).collect();
                order.shuffle(&mut *ctx.rng);
                self.run_selector(ctx, delta_millis, &order)
            }
            NodeKind::Parallel => self.run_parallel(ctx, delta_millis),
            NodeKind::Invert => match self.run_single_child(ctx, delta_millis) {
                TreeNodeStatus::Finished => TreeNodeStatus::Failed,
                TreeNodeStatus::Failed | TreeNodeStatus::CannotExecute => TreeNodeStatus::Finished,
                other => other,
            },
            NodeKind::Succeed => match self.run_single_child(ctx, delta_millis) {
                TreeNodeStatus::Running => TreeNodeStatus::Running,
                _ => TreeNodeStatus::Finished,
            },
            NodeKind::Fail => match self.run_single_child(ctx, delta_millis) {
                TreeNodeStatus::Running => TreeNodeStatus::Running,
                _ => TreeNodeStatus::Failed,
            },
            NodeKind::Idle { millis } => self.run_idle(ctx, *millis),
            NodeKind::Wander { speed } => {
                wander(ctx, *speed, delta_millis);
                TreeNodeStatus::Finished
            }
        };
        self.record(ctx, status)
    }

    fn record(&self, ctx: &mut ExecContext<'_>, status: TreeNodeStatus) -> TreeNodeStatus {
        let state = ctx.run_state.entry(self.id());
        state.last_exec_millis = ctx.time_millis;
        state.last_status = status;
        status
    }

    fn run_sequence(&self, ctx: &mut ExecContext<'_>, delta_millis: i64) -> TreeNodeStatus {
        // A resume point whose child is gone restarts the sequence.
        let resume = ctx
            .run_state
            .get(self.id())
            .filter(|s| s.last_status == TreeNodeStatus::Running)
            .and_then(|s| s.selected_child)
            .and_then(|id| self.children().iter().position(|c| c.id() == id))
            .unwrap_or(0);

        for child in self.children().iter().skip(resume) {
            let status = child.execute(ctx, delta_millis);
            if status == TreeNodeStatus::Running {
                ctx.run_state.entry(self.id()).selected_child = Some(child.id());
                return TreeNodeStatus::Running;
            }
            if status.is_failure() {
                ctx.run_state.entry(self.id()).selected_child = None;
                return TreeNodeStatus::Failed;
            }
        }
        ctx.run_state.entry(self.id()).selected_child = None;
        TreeNodeStatus::Finished
    }

    fn run_selector(&self, ctx: &mut ExecContext<'_>, delta_millis: i64, order: &[usize]) -> TreeNodeStatus {
        for &index in order {
            let Some(child) = self.children().get(index) else {
                continue;
            };
            let status = child.execute(ctx, delta_millis);
            if !status.is_failure() {
                ctx.run_state.entry(self.id()).selected_child = Some(child.id());
                return status;
            }
        }
        ctx.run_state.entry(self.id()).selected_child = None;
        TreeNodeStatus::Failed
    }

    fn run_parallel(&self, ctx: &mut ExecContext<'_>, delta_millis: i64) -> TreeNodeStatus {
        let mut any_running = false;
        let mut any_finished = false;
        for child in self.children() {
            match child.execute(ctx, delta_millis) {
                TreeNodeStatus::Running => any_running = true,
                TreeNodeStatus::Finished => any_finished = true,
                _ => {}
            }
        }
        if any_running {
            TreeNodeStatus::Running
        } else if any_finished || self.children().is_empty() {
            TreeNodeStatus::Finished
        } else {
            TreeNodeStatus::Failed
        }
    }

    fn run_single_child(&self, ctx: &mut ExecContext<'_>, delta_millis: i64) -> TreeNodeStatus {
        self.children()
            .first()
            .map_or(TreeNodeStatus::Finished, |child| child.execute(ctx, delta_millis))
    }

    fn run_idle(&self, ctx: &mut ExecContext<'_>, millis: i64) -> TreeNodeStatus {
        let now = ctx.time_millis;
        let state = ctx.run_state.entry(self.id());
        let since = *state.idle_since.get_or_insert(now);
        if now.saturating_sub(since) >= millis {
            state.idle_since = None;
            TreeNodeStatus::Finished
        } else {
            TreeNodeStatus::Running
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn wander(ctx: &mut ExecContext<'_>, speed: f32, delta_millis: i64) {
    let turn: f32 = ctx.rng.random_range(-0.5..=0.5);
    let character = &mut *ctx.character;
    character.orientation = (character.orientation + turn).rem_euclid(std::f32::consts::TAU);
    let distance = speed * (delta_millis.max(0) as f32) / 1000.0;
    character.position.x += character.orientation.cos() * distance;
    character.position.z += character.orientation.sin() * distance;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use arbor_types::{CharacterId, NodeId, Vec3};
    use rand::SeedableRng as _;

    use super::*;
    use crate::registry::AiRegistry;
    use crate::tree::BehaviorTree;

    struct Fixture {
        character: Character,
        aggro: Vec<AggroEntry>,
        run_state: RunState,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                character: Character::new(CharacterId::new(1), Vec3::default()),
                aggro: Vec::new(),
                run_state: RunState::new(),
                rng: StdRng::seed_from_u64(7),
            }
        }

        fn run(&mut self, node: &TreeNode, time_millis: i64, delta_millis: i64) -> TreeNodeStatus {
            let mut ctx = ExecContext {
                character: &mut self.character,
                aggro: &self.aggro,
                run_state: &mut self.run_state,
                rng: &mut self.rng,
                time_millis,
            };
            node.execute(&mut ctx, delta_millis)
        }
    }

    fn build(rows: &[(u32, Option<u32>, &str, Option<&str>)]) -> BehaviorTree {
        let registry = AiRegistry::default();
        let mut tree: Option<BehaviorTree> = None;
        for &(id, parent, node_type, condition) in rows {
            let mut node = registry
                .parse_node(node_type, &format!("n{id}"), NodeId::new(id))
                .unwrap();
            if let Some(expr) = condition {
                node.set_condition(Some(registry.parse_condition(expr).unwrap()));
            }
            match parent {
                Some(p) => tree.as_mut().unwrap().add_child(NodeId::new(p), node).unwrap(),
                None => tree = Some(BehaviorTree::new(node)),
            }
        }
        tree.unwrap()
    }

    #[test]
    fn sequence_resumes_running_child() {
        let tree = build(&[
            (1, None, "Sequence", None),
            (2, Some(1), "Succeed", None),
            (3, Some(1), "Idle{100}", None),
            (4, Some(1), "Succeed", None),
        ]);
        let mut fx = Fixture::new();

        assert_eq!(fx.run(tree.root(), 0, 0), TreeNodeStatus::Running);
        assert_eq!(fx.run_state.running_children(tree.root()), vec![false, true, false]);
        assert_eq!(fx.run_state.last_exec_millis(NodeId::new(2)), 0);

        // Resuming skips the first child.
        assert_eq!(fx.run(tree.root(), 50, 50), TreeNodeStatus::Running);
        assert_eq!(fx.run_state.last_exec_millis(NodeId::new(2)), 0);

        assert_eq!(fx.run(tree.root(), 100, 50), TreeNodeStatus::Finished);
        assert_eq!(fx.run_state.last_status(NodeId::new(4)), TreeNodeStatus::Finished);
        assert_eq!(fx.run_state.running_children(tree.root()), vec![false, false, false]);
    }

    #[test]
    fn sequence_resumes_by_id_after_sibling_removed() {
        let mut tree = build(&[
            (1, None, "Sequence", None),
            (2, Some(1), "Succeed", None),
            (3, Some(1), "Idle{1000}", None),
            (4, Some(1), "Idle{1000}", None),
        ]);
        let mut fx = Fixture::new();

        assert_eq!(fx.run(tree.root(), 10, 10), TreeNodeStatus::Running);
        assert_eq!(fx.run_state.running_children(tree.root()), vec![false, true, false]);

        tree.remove_node(NodeId::new(2)).unwrap();
        fx.run_state.forget([NodeId::new(2)]);
        assert_eq!(fx.run_state.running_children(tree.root()), vec![true, false]);

        // The waiting child resumes; its later sibling stays untouched.
        assert_eq!(fx.run(tree.root(), 20, 10), TreeNodeStatus::Running);
        assert_eq!(fx.run_state.last_exec_millis(NodeId::new(3)), 20);
        assert_eq!(fx.run_state.last_exec_millis(NodeId::new(4)), -1);
    }

    #[test]
    fn sequence_restarts_when_running_child_removed() {
        let mut tree = build(&[
            (1, None, "Sequence", None),
            (2, Some(1), "Idle{1000}", None),
            (3, Some(1), "Idle{1000}", None),
        ]);
        let mut fx = Fixture::new();
        assert_eq!(fx.run(tree.root(), 10, 10), TreeNodeStatus::Running);

        tree.remove_node(NodeId::new(2)).unwrap();
        fx.run_state.forget([NodeId::new(2)]);

        assert_eq!(fx.run(tree.root(), 20, 10), TreeNodeStatus::Running);
        assert_eq!(
            fx.run_state.get(NodeId::new(1)).unwrap().selected_child,
            Some(NodeId::new(3))
        );
    }

    #[test]
    fn selector_takes_first_success() {
        let tree = build(&[
            (1, None, "PrioritySelector", None),
            (2, Some(1), "Fail", None),
            (3, Some(1), "Succeed", Some("False")),
            (4, Some(1), "Succeed", None),
            (5, Some(1), "Succeed", None),
        ]);
        let mut fx = Fixture::new();

        assert_eq!(fx.run(tree.root(), 10, 10), TreeNodeStatus::Finished);
        assert_eq!(fx.run_state.last_status(NodeId::new(2)), TreeNodeStatus::Failed);
        assert_eq!(fx.run_state.last_status(NodeId::new(3)), TreeNodeStatus::CannotExecute);
        assert_eq!(fx.run_state.condition_description(NodeId::new(3)), Some("False[0]"));
        assert_eq!(fx.run_state.last_status(NodeId::new(5)), TreeNodeStatus::Unknown);
        assert_eq!(fx.run_state.last_exec_millis(NodeId::new(5)), -1);
        assert_eq!(fx.run_state.get(NodeId::new(1)).unwrap().selected_child, Some(NodeId::new(4)));
    }

    #[test]
    fn empty_selector_fails() {
        let tree = build(&[(1, None, "RandomSelector", None)]);
        let mut fx = Fixture::new();
        assert_eq!(fx.run(tree.root(), 0, 0), TreeNodeStatus::Failed);
    }

    #[test]
    fn decorators() {
        let tree = build(&[
            (1, None, "Parallel", None),
            (2, Some(1), "Invert", None),
            (3, Some(2), "Fail", None),
            (4, Some(1), "Fail", None),
            (5, Some(4), "Succeed", None),
        ]);
        let mut fx = Fixture::new();
        assert_eq!(fx.run(tree.root(), 0, 0), TreeNodeStatus::Finished);
        assert_eq!(fx.run_state.last_status(NodeId::new(2)), TreeNodeStatus::Finished);
        assert_eq!(fx.run_state.last_status(NodeId::new(4)), TreeNodeStatus::Failed);
    }

    #[test]
    fn guard_description_records_every_argument() {
        let tree = build(&[(1, None, "Succeed", Some("And(HasEnemies{1},Not(False))"))]);
        let mut fx = Fixture::new();

        assert_eq!(fx.run(tree.root(), 0, 0), TreeNodeStatus::CannotExecute);
        assert_eq!(
            fx.run_state.condition_description(NodeId::new(1)),
            Some("And(HasEnemies{1}[0],Not(False[0])[1])[0]")
        );

        fx.aggro.push(AggroEntry {
            character_id: CharacterId::new(9),
            aggro: 3.0,
        });
        assert_eq!(fx.run(tree.root(), 10, 10), TreeNodeStatus::Finished);
        assert_eq!(
            fx.run_state.condition_description(NodeId::new(1)),
            Some("And(HasEnemies{1}[1],Not(False[0])[1])[1]")
        );
    }

    #[test]
    fn wander_moves_character() {
        let tree = build(&[(1, None, "Wander{2.0}", None)]);
        let mut fx = Fixture::new();
        assert_eq!(fx.run(tree.root(), 500, 500), TreeNodeStatus::Finished);
        let p = fx.character.position;
        let moved = p.x.hypot(p.z);
        assert!((moved - 1.0).abs() < 1e-4, "moved {moved}");
    }
}
