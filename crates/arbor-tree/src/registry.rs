//! Name-to-constructor registry for node types and conditions.
//!
//! Parsing a type expression such as `Idle{500}` looks the leading name up
//! in the registry and hands the parameters to the registered factory.
//! Supporting a new kind means registering a new entry; nothing is
//! subclassed. [`AiRegistry::default`] comes with every built-in kind.

use std::collections::BTreeMap;

use arbor_types::NodeId;
use tracing::debug;

use crate::condition::{Condition, ConditionKind};
use crate::error::TreeError;
use crate::grammar::{Expression, parse_expression};
use crate::node::{NodeKind, TreeNode};

/// Arguments handed to a [`NodeFactory`].
#[derive(Debug, Clone, Copy)]
pub struct NodeArgs<'a> {
    /// The registered type name being constructed.
    pub name: &'a str,
    /// Trimmed text between the braces, empty when absent.
    pub parameters: &'a str,
}

/// Arguments handed to a [`ConditionFactory`].
#[derive(Debug)]
pub struct ConditionArgs<'a> {
    /// The registered condition name being constructed.
    pub name: &'a str,
    /// Trimmed text between the braces, empty when absent.
    pub parameters: &'a str,
    /// Already resolved argument conditions.
    pub arguments: Vec<Condition>,
}

/// Builds a node kind from parsed parameters.
pub type NodeFactory = fn(NodeArgs<'_>) -> Result<NodeKind, TreeError>;

/// Builds a condition kind from parsed parameters and arguments.
pub type ConditionFactory = fn(ConditionArgs<'_>) -> Result<ConditionKind, TreeError>;

/// Registry of node types and conditions known to the server.
#[derive(Debug, Clone)]
pub struct AiRegistry {
    nodes: BTreeMap<String, NodeFactory>,
    conditions: BTreeMap<String, ConditionFactory>,
}

impl Default for AiRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AiRegistry {
    /// Create a registry with no entries.
    pub const fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
            conditions: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in node type and condition.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register_node("Sequence", |args| no_parameters(args, NodeKind::Sequence));
        registry.register_node("PrioritySelector", |args| {
            no_parameters(args, NodeKind::PrioritySelector)
        });
        registry.register_node("RandomSelector", |args| {
            no_parameters(args, NodeKind::RandomSelector)
        });
        registry.register_node("Parallel", |args| no_parameters(args, NodeKind::Parallel));
        registry.register_node("Invert", |args| no_parameters(args, NodeKind::Invert));
        registry.register_node("Succeed", |args| no_parameters(args, NodeKind::Succeed));
        registry.register_node("Fail", |args| no_parameters(args, NodeKind::Fail));
        registry.register_node("Idle", |args| {
            let millis = parse_number(args.name, args.parameters, 1000_i64)?;
            if millis < 0 {
                return Err(invalid(args.name, args.parameters, "duration must not be negative"));
            }
            Ok(NodeKind::Idle { millis })
        });
        registry.register_node("Wander", |args| {
            let speed = parse_number(args.name, args.parameters, 1.0_f32)?;
            if !speed.is_finite() || speed < 0.0 {
                return Err(invalid(args.name, args.parameters, "speed must be a non-negative number"));
            }
            Ok(NodeKind::Wander { speed })
        });

        registry.register_condition("True", |args| leaf(&args, ConditionKind::True));
        registry.register_condition("False", |args| leaf(&args, ConditionKind::False));
        registry.register_condition("Not", |mut args| {
            if args.arguments.len() != 1 {
                return Err(invalid(args.name, args.parameters, "expects exactly one argument"));
            }
            args.arguments
                .pop()
                .map(|inner| ConditionKind::Not(Box::new(inner)))
                .ok_or_else(|| invalid(args.name, args.parameters, "expects exactly one argument"))
        });
        registry.register_condition("And", |args| {
            if args.arguments.is_empty() {
                return Err(invalid(args.name, args.parameters, "expects at least one argument"));
            }
            Ok(ConditionKind::And(args.arguments))
        });
        registry.register_condition("Or", |args| {
            if args.arguments.is_empty() {
                return Err(invalid(args.name, args.parameters, "expects at least one argument"));
            }
            Ok(ConditionKind::Or(args.arguments))
        });
        registry.register_condition("HasEnemies", |args| {
            let min = parse_number(args.name, args.parameters, 1_usize)?;
            leaf(&args, ConditionKind::HasEnemies { min })
        });
        registry.register_condition("Random", |args| {
            let probability = parse_number(args.name, args.parameters, 0.5_f32)?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(invalid(args.name, args.parameters, "probability must be within 0..=1"));
            }
            leaf(&args, ConditionKind::Random { probability })
        });

        registry
    }

    /// Register (or replace) a node type. Returns `true` if the name was new.
    pub fn register_node(&mut self, name: &str, factory: NodeFactory) -> bool {
        self.nodes.insert(name.to_owned(), factory).is_none()
    }

    /// Register (or replace) a condition. Returns `true` if the name was new.
    pub fn register_condition(&mut self, name: &str, factory: ConditionFactory) -> bool {
        self.conditions.insert(name.to_owned(), factory).is_none()
    }

    /// Registered node type names, sorted.
    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Registered condition names, sorted.
    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Parse a node type expression into a childless node with the given
    /// id and display name.
    pub fn parse_node(&self, type_expression: &str, name: &str, id: NodeId) -> Result<TreeNode, TreeError> {
        let expression = parse_expression(type_expression)?;
        if !expression.arguments.is_empty() {
            return Err(TreeError::Syntax {
                expression: type_expression.to_owned(),
                position: 0,
                message: String::from("node type expressions take no arguments"),
            });
        }
        let factory = self
            .nodes
            .get(&expression.name)
            .ok_or_else(|| TreeError::UnknownNodeType(expression.name.clone()))?;
        let kind = factory(NodeArgs {
            name: &expression.name,
            parameters: &expression.parameters,
        })?;
        debug!(node_type = %expression.name, %id, "parsed tree node");
        Ok(TreeNode::new(id, name, expression.name, expression.parameters, kind))
    }

    /// Parse a condition expression.
    pub fn parse_condition(&self, condition_expression: &str) -> Result<Condition, TreeError> {
        let expression = parse_expression(condition_expression)?;
        self.build_condition(expression)
    }

    fn build_condition(&self, expression: Expression) -> Result<Condition, TreeError> {
        let factory = *self
            .conditions
            .get(&expression.name)
            .ok_or_else(|| TreeError::UnknownCondition(expression.name.clone()))?;
        let arguments = expression
            .arguments
            .into_iter()
            .map(|arg| self.build_condition(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let kind = factory(ConditionArgs {
            name: &expression.name,
            parameters: &expression.parameters,
            arguments,
        })?;
        Ok(Condition::new(expression.name, expression.parameters, kind))
    }
}

fn invalid(name: &str, parameters: &str, reason: &str) -> TreeError {
    TreeError::InvalidParameters {
        name: name.to_owned(),
        parameters: parameters.to_owned(),
        reason: reason.to_owned(),
    }
}

fn no_parameters(args: NodeArgs<'_>, kind: NodeKind) -> Result<NodeKind, TreeError> {
    if args.parameters.is_empty() {
        Ok(kind)
    } else {
        Err(invalid(args.name, args.parameters, "takes no parameters"))
    }
}

fn leaf(args: &ConditionArgs<'_>, kind: ConditionKind) -> Result<ConditionKind, TreeError> {
    if args.arguments.is_empty() {
        Ok(kind)
    } else {
        Err(invalid(args.name, args.parameters, "takes no arguments"))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, parameters: &str, default: T) -> Result<T, TreeError> {
    if parameters.is_empty() {
        return Ok(default);
    }
    parameters
        .parse()
        .map_err(|_| invalid(name, parameters, "expected a number"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = AiRegistry::default();
        let types: Vec<&str> = registry.node_types().collect();
        assert!(types.contains(&"Sequence"));
        assert!(types.contains(&"Idle"));
        assert!(types.contains(&"Wander"));
        assert_eq!(registry.condition_names().count(), 7);
    }

    #[test]
    fn parse_node_keeps_source_text() {
        let registry = AiRegistry::default();
        let node = registry.parse_node("Idle{ 250 }", "wait", NodeId::new(4)).unwrap();
        assert_eq!(node.id(), NodeId::new(4));
        assert_eq!(node.name(), "wait");
        assert_eq!(node.node_type(), "Idle");
        assert_eq!(node.parameters(), "250");
        assert_eq!(node.kind(), &NodeKind::Idle { millis: 250 });
        assert!(node.children().is_empty());
    }

    #[test]
    fn parse_node_defaults() {
        let registry = AiRegistry::default();
        let idle = registry.parse_node("Idle", "i", NodeId::new(1)).unwrap();
        assert_eq!(idle.kind(), &NodeKind::Idle { millis: 1000 });
        let wander = registry.parse_node("Wander", "w", NodeId::new(1)).unwrap();
        assert_eq!(wander.kind(), &NodeKind::Wander { speed: 1.0 });
    }

    #[test]
    fn parse_node_rejections() {
        let registry = AiRegistry::default();
        assert_eq!(
            registry.parse_node("Teleport", "t", NodeId::new(1)).unwrap_err(),
            TreeError::UnknownNodeType(String::from("Teleport"))
        );
        assert!(matches!(
            registry.parse_node("Sequence{3}", "s", NodeId::new(1)),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_node("Idle{soon}", "i", NodeId::new(1)),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_node("Sequence(True)", "s", NodeId::new(1)),
            Err(TreeError::Syntax { .. })
        ));
        assert!(registry.parse_node("", "s", NodeId::new(1)).unwrap_err().is_parse_failure());
    }

    #[test]
    fn parse_nested_condition() {
        let registry = AiRegistry::default();
        let condition = registry
            .parse_condition("And(HasEnemies{2}, Not(Random{0.25}))")
            .unwrap();
        assert_eq!(condition.name(), "And");
        assert_eq!(condition.arguments().len(), 2);
        assert_eq!(condition.describe(), "And(HasEnemies{2},Not(Random{0.25}))");
    }

    #[test]
    fn condition_arity_is_checked() {
        let registry = AiRegistry::default();
        assert!(matches!(
            registry.parse_condition("Not"),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_condition("Not(True,False)"),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_condition("Or"),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_condition("True(False)"),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            registry.parse_condition("Random{1.5}"),
            Err(TreeError::InvalidParameters { .. })
        ));
        assert_eq!(
            registry.parse_condition("Not(Sleepy)").unwrap_err(),
            TreeError::UnknownCondition(String::from("Sleepy"))
        );
    }

    #[test]
    fn custom_registration() {
        let mut registry = AiRegistry::empty();
        assert!(registry.register_node("Wait", |_| Ok(NodeKind::Idle { millis: 10 })));
        assert!(!registry.register_node("Wait", |_| Ok(NodeKind::Idle { millis: 20 })));
        let node = registry.parse_node("Wait", "w", NodeId::new(1)).unwrap();
        assert_eq!(node.kind(), &NodeKind::Idle { millis: 20 });
        assert!(registry.parse_node("Sequence", "s", NodeId::new(1)).is_err());
    }
}
