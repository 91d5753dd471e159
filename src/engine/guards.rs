// Guard evaluation - how conditions gate transitions

//! # Guard Evaluation
//!
//! Decides whether a transition may fire. Two layers:
//!
//! - [`GuardEvaluator`] owns the **combination policy**: an inline guard
//!   expression on the transition is the primary condition and is evaluated
//!   alone; otherwise the `active` attached conditions are combined with
//!   logical AND; an empty active set means "always allowed".
//! - [`ExpressionEvaluator`] is the seam to the **expression language**,
//!   which is external to this crate. The shipped [`MarkerEvaluator`]
//!   treats expressions as boolean markers: the literal `"false"` fails,
//!   a registered named predicate is consulted when one matches, a boolean
//!   instance variable of the same name is consulted next, and anything
//!   else passes.
//!
//! Evaluation is pure and side-effect-free; the engine never retries it.

use std::collections::HashMap;

use crate::models::{Instance, Transition, Variable, VariableValue};

/// Read-only view over an instance's variables, built per evaluation.
pub struct GuardContext<'a> {
    variables: &'a [Variable],
}

impl<'a> GuardContext<'a> {
    pub fn new(variables: &'a [Variable]) -> Self {
        GuardContext { variables }
    }

    pub fn from_instance(instance: &'a Instance) -> Self {
        GuardContext {
            variables: &instance.variables,
        }
    }

    /// Look up a variable value by name.
    pub fn variable(&self, name: &str) -> Option<&VariableValue> {
        self.variables.iter().find(|v| v.name == name).map(|v| &v.value)
    }

    /// Look up a BOOLEAN variable by name.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.variable(name).and_then(VariableValue::as_bool)
    }
}

/// Evaluates a single opaque guard expression against a context.
///
/// Implement this to plug in a real expression language; the engine only
/// ever calls it through the combination policy in [`GuardEvaluator`].
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, ctx: &GuardContext<'_>) -> bool;
}

/// Named predicate over a guard context.
pub type Predicate = dyn Fn(&GuardContext<'_>) -> bool + Send + Sync;

/// Default evaluator: expressions are boolean markers.
///
/// Resolution order for an expression:
/// 1. literal `"true"` / `"false"` (trimmed, case-insensitive)
/// 2. a predicate registered under the expression text
/// 3. a BOOLEAN instance variable named like the expression
/// 4. otherwise: satisfied - absence of a resolvable meaning is not a veto
///
/// ```rust
/// # use trellis::{GuardContext, ExpressionEvaluator, MarkerEvaluator};
/// let mut evaluator = MarkerEvaluator::new();
/// evaluator.register("business_hours", |_ctx| true);
///
/// let ctx = GuardContext::new(&[]);
/// assert!(evaluator.evaluate("business_hours", &ctx));
/// assert!(!evaluator.evaluate("false", &ctx));
/// assert!(evaluator.evaluate("unknown_marker", &ctx));
/// ```
#[derive(Default)]
pub struct MarkerEvaluator {
    predicates: HashMap<String, Box<Predicate>>,
}

impl MarkerEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named predicate. Replaces any previous registration
    /// under the same name.
    pub fn register<N, F>(&mut self, name: N, predicate: F)
    where
        N: Into<String>,
        F: Fn(&GuardContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Box::new(predicate));
    }
}

impl ExpressionEvaluator for MarkerEvaluator {
    fn evaluate(&self, expression: &str, ctx: &GuardContext<'_>) -> bool {
        let marker = expression.trim();
        if marker.eq_ignore_ascii_case("true") {
            return true;
        }
        if marker.eq_ignore_ascii_case("false") {
            return false;
        }
        if let Some(predicate) = self.predicates.get(marker) {
            return predicate(ctx);
        }
        if let Some(flag) = ctx.flag(marker) {
            return flag;
        }
        true
    }
}

/// The combination policy over a transition's guards.
pub struct GuardEvaluator {
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl Default for GuardEvaluator {
    fn default() -> Self {
        GuardEvaluator {
            evaluator: Box::new(MarkerEvaluator::new()),
        }
    }
}

impl GuardEvaluator {
    /// Policy over the default [`MarkerEvaluator`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy over a caller-supplied expression evaluator.
    pub fn with_evaluator(evaluator: Box<dyn ExpressionEvaluator>) -> Self {
        GuardEvaluator { evaluator }
    }

    /// Whether the transition may fire in the given context.
    ///
    /// Inline guard expression first and alone when present; otherwise AND
    /// over active attached conditions; no guards at all passes.
    pub fn is_satisfied(&self, transition: &Transition, ctx: &GuardContext<'_>) -> bool {
        if let Some(expression) = transition.guard_expression.as_deref() {
            if !expression.is_empty() {
                return self.evaluator.evaluate(expression, ctx);
            }
        }

        transition
            .active_conditions()
            .all(|condition| self.evaluator.evaluate(&condition.expression, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    fn ctx_with<'a>(variables: &'a [Variable]) -> GuardContext<'a> {
        GuardContext::new(variables)
    }

    #[test]
    fn no_guards_means_always_allowed() {
        let transition = Transition::new("go", "a", "b");
        let guards = GuardEvaluator::new();
        assert!(guards.is_satisfied(&transition, &ctx_with(&[])));
    }

    #[test]
    fn single_false_condition_is_never_satisfied() {
        let transition = Transition::new("go", "a", "b")
            .with_condition(Condition::for_transition("blocked", "false", "go"));
        let guards = GuardEvaluator::new();
        assert!(!guards.is_satisfied(&transition, &ctx_with(&[])));
    }

    #[test]
    fn inactive_conditions_are_ignored() {
        let transition = Transition::new("go", "a", "b")
            .with_condition(Condition::for_transition("blocked", "false", "go").inactive());
        let guards = GuardEvaluator::new();
        assert!(guards.is_satisfied(&transition, &ctx_with(&[])));
    }

    #[test]
    fn active_conditions_combine_with_and() {
        let transition = Transition::new("go", "a", "b")
            .with_condition(Condition::for_transition("ok", "true", "go"))
            .with_condition(Condition::for_transition("blocked", "false", "go"));
        let guards = GuardEvaluator::new();
        assert!(!guards.is_satisfied(&transition, &ctx_with(&[])));
    }

    #[test]
    fn inline_expression_is_primary_over_conditions() {
        // Attached condition would fail, but the inline guard wins
        let transition = Transition::new("go", "a", "b")
            .with_guard("true")
            .with_condition(Condition::for_transition("blocked", "false", "go"));
        let guards = GuardEvaluator::new();
        assert!(guards.is_satisfied(&transition, &ctx_with(&[])));
    }

    #[test]
    fn marker_falls_back_to_boolean_variable() {
        let variables = vec![
            Variable::new("approved", true),
            Variable::new("rejected", false),
        ];
        let evaluator = MarkerEvaluator::new();
        let ctx = ctx_with(&variables);

        assert!(evaluator.evaluate("approved", &ctx));
        assert!(!evaluator.evaluate("rejected", &ctx));
        // Unknown markers default to satisfied
        assert!(evaluator.evaluate("unheard_of", &ctx));
    }

    #[test]
    fn registered_predicate_beats_variable_fallback() {
        let variables = vec![Variable::new("quorum", true)];
        let mut evaluator = MarkerEvaluator::new();
        evaluator.register("quorum", |_ctx| false);

        assert!(!evaluator.evaluate("quorum", &ctx_with(&variables)));
    }
}
