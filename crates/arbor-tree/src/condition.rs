//! Conditions guarding behavior-tree nodes.
//!
//! A [`Condition`] keeps the name and parameters it was parsed from (shown
//! in static snapshots) next to its resolved [`ConditionKind`]. Evaluation
//! writes a description such as `And(HasEnemies{2}[1],Not(Random{0.1}[0])[1])[1]`
//! that the owning agent stores as its "last evaluated" string.

use std::fmt::Write as _;

use rand::Rng as _;

use crate::exec::ExecContext;

/// Resolved behavior of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    /// Always true.
    True,
    /// Always false.
    False,
    /// Negates its single argument.
    Not(Box<Condition>),
    /// True when every argument is true. Evaluates all arguments.
    And(Vec<Condition>),
    /// True when any argument is true. Evaluates all arguments.
    Or(Vec<Condition>),
    /// True when the aggro table holds at least `min` entries.
    HasEnemies {
        /// Minimum number of aggro entries.
        min: usize,
    },
    /// True with the given probability on each evaluation.
    Random {
        /// Probability in `0.0..=1.0`.
        probability: f32,
    },
}

/// A parsed condition with its source name and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    name: String,
    parameters: String,
    kind: ConditionKind,
}

impl Condition {
    /// Create a condition from its registered name, parameters, and kind.
    pub fn new(name: impl Into<String>, parameters: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into(),
            kind,
        }
    }

    /// The always-true condition.
    pub fn always() -> Self {
        Self::new("True", "", ConditionKind::True)
    }

    /// Registered name this condition was parsed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw parameter string.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Resolved kind.
    pub const fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    /// Arguments of composite conditions, empty for leaves.
    pub fn arguments(&self) -> &[Self] {
        match &self.kind {
            ConditionKind::Not(inner) => std::slice::from_ref(inner.as_ref()),
            ConditionKind::And(args) | ConditionKind::Or(args) => args,
            _ => &[],
        }
    }

    /// Static description without evaluation results, e.g. `Not(HasEnemies{1})`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.write_head(&mut out);
        let args = self.arguments();
        if !args.is_empty() {
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&arg.describe());
            }
            out.push(')');
        }
        out
    }

    /// Evaluate against an agent, appending the described result to `out`.
    pub fn evaluate(&self, ctx: &mut ExecContext<'_>, out: &mut String) -> bool {
        self.write_head(out);
        let result = match &self.kind {
            ConditionKind::True => true,
            ConditionKind::False => false,
            ConditionKind::Not(inner) => {
                out.push('(');
                let r = !inner.evaluate(ctx, out);
                out.push(')');
                r
            }
            ConditionKind::And(args) => {
                let results = Self::evaluate_all(args, ctx, out);
                results.iter().all(|r| *r)
            }
            ConditionKind::Or(args) => {
                let results = Self::evaluate_all(args, ctx, out);
                results.iter().any(|r| *r)
            }
            ConditionKind::HasEnemies { min } => ctx.aggro.len() >= *min,
            ConditionKind::Random { probability } => ctx.rng.random::<f32>() < *probability,
        };
        let _ = write!(out, "[{}]", u8::from(result));
        result
    }

    fn evaluate_all(args: &[Self], ctx: &mut ExecContext<'_>, out: &mut String) -> Vec<bool> {
        out.push('(');
        let mut results = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            results.push(arg.evaluate(ctx, out));
        }
        out.push(')');
        results
    }

    fn write_head(&self, out: &mut String) {
        out.push_str(&self.name);
        if !self.parameters.is_empty() {
            let _ = write!(out, "{{{}}}", self.parameters);
        }
    }
}
