// Condition records - guard expressions attached to graph elements

//! # Condition Model
//!
//! A [`Condition`] carries an opaque guard expression and an active flag.
//! Each condition is attached to exactly one status or one transition; the
//! [`ConditionTarget`] enum tags which, so the two attachments cannot be
//! mixed. Only transition-attached conditions participate in guard
//! evaluation; status-attached conditions are annotations for external
//! tooling.
//!
//! The expression language itself is external to this crate - see
//! [`crate::engine::guards`] for how expressions combine and what the
//! default evaluator does with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{StatusId, TransitionId};

/// Which graph element a condition is attached to. Mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ConditionTarget {
    Status(StatusId),
    Transition(TransitionId),
}

/// A guard record: an opaque expression plus an active flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Short label for the condition ("has_reviewer", "amount_within_limit")
    pub name: String,

    /// Opaque guard expression, evaluated by an [`ExpressionEvaluator`]
    ///
    /// [`ExpressionEvaluator`]: crate::engine::guards::ExpressionEvaluator
    pub expression: String,

    pub description: Option<String>,

    /// Free-form category label carried through from authoring tools
    pub kind: Option<String>,

    /// Inactive conditions are ignored by guard evaluation
    pub active: bool,

    /// The status or transition this condition is attached to
    pub attached_to: ConditionTarget,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Condition {
    /// Create an active condition attached to a transition.
    pub fn for_transition<N, E, T>(name: N, expression: E, transition: T) -> Self
    where
        N: Into<String>,
        E: Into<String>,
        T: Into<TransitionId>,
    {
        Self::build(name, expression, ConditionTarget::Transition(transition.into()))
    }

    /// Create an active condition attached to a status.
    pub fn for_status<N, E, S>(name: N, expression: E, status: S) -> Self
    where
        N: Into<String>,
        E: Into<String>,
        S: Into<StatusId>,
    {
        Self::build(name, expression, ConditionTarget::Status(status.into()))
    }

    fn build<N: Into<String>, E: Into<String>>(
        name: N,
        expression: E,
        attached_to: ConditionTarget,
    ) -> Self {
        let now = Utc::now();
        Condition {
            name: name.into(),
            expression: expression.into(),
            description: None,
            kind: None,
            active: true,
            attached_to,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deactivate the condition, builder-style.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
