// Transition edges - directed, optionally guarded status changes

//! # Transition Model
//!
//! A [`Transition`] is a directed edge between two statuses of the same
//! workflow. It may carry an inline guard expression and owns zero or more
//! attached [`Condition`] records; the combination policy (inline expression
//! is primary, otherwise active conditions AND together, no guards means
//! always allowed) lives in [`crate::engine::guards`].

use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionTarget};
use super::ids::{StatusId, TransitionId};

/// A directed, optionally guarded edge between two statuses.
///
/// ## Examples
///
/// ```rust
/// # use trellis::Transition;
/// let submit = Transition::new("submit", "draft", "review")
///     .with_name("Submit for review")
///     .with_guard("document_complete");
/// assert!(submit.has_guard());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// Identifier, unique within the owning workflow
    pub id: TransitionId,

    /// Optional display name, carried onto the exported sequence flow
    pub name: Option<String>,

    /// Status this transition fires from
    pub source: StatusId,

    /// Status this transition moves the instance to
    pub target: StatusId,

    /// Inline guard expression; when present it is the primary guard and
    /// attached conditions are not consulted
    pub guard_expression: Option<String>,

    /// Attached condition records; only `active` ones participate in
    /// guard evaluation
    pub conditions: Vec<Condition>,
}

impl Transition {
    /// Create an unguarded transition.
    pub fn new<I, S, T>(id: I, source: S, target: T) -> Self
    where
        I: Into<TransitionId>,
        S: Into<StatusId>,
        T: Into<StatusId>,
    {
        Transition {
            id: id.into(),
            name: None,
            source: source.into(),
            target: target.into(),
            guard_expression: None,
            conditions: Vec::new(),
        }
    }

    /// Set the display name, builder-style.
    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the inline guard expression, builder-style.
    pub fn with_guard<G: Into<String>>(mut self, expression: G) -> Self {
        self.guard_expression = Some(expression.into());
        self
    }

    /// Attach a condition record to this transition.
    ///
    /// The condition's attachment tag is rewritten to point at this
    /// transition so a record created for another element cannot be
    /// smuggled in.
    pub fn add_condition(&mut self, mut condition: Condition) {
        condition.attached_to = ConditionTarget::Transition(self.id.clone());
        self.conditions.push(condition);
    }

    /// Attach a condition record, builder-style.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.add_condition(condition);
        self
    }

    /// Active attached conditions, in declared order.
    pub fn active_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| c.active)
    }

    /// Whether any guard applies: a non-empty inline expression or at least
    /// one active attached condition.
    pub fn has_guard(&self) -> bool {
        self.guard_expression
            .as_deref()
            .is_some_and(|e| !e.is_empty())
            || self.active_conditions().next().is_some()
    }
}
