// Instance - one run of a workflow definition

//! # Instance Model
//!
//! An [`Instance`] is one execution of a workflow: a business key, the
//! fine-grained position inside the graph (`current_status`), the coarse
//! lifecycle state ([`InstanceState`]), an append-only transition history,
//! and a bag of typed variables.
//!
//! State changes happen only through the transition engine. The mutating
//! methods here keep the bookkeeping in one place - record first, then
//! move - so a history row can never be missing for an applied transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{StatusId, TransitionId, WorkflowId};
use super::transition::Transition;
use super::variable::{Variable, VariableValue};

/// Coarse lifecycle state of an instance.
///
/// `Created` until the first transition fires, `InProgress` after it,
/// `Completed` once the instance enters a FINAL status. Terminal: no
/// transition ever succeeds on a `Completed` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Created,
    InProgress,
    Completed,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InstanceState::Created => "CREATED",
            InstanceState::InProgress => "IN_PROGRESS",
            InstanceState::Completed => "COMPLETED",
        };
        write!(f, "{label}")
    }
}

/// Immutable audit record of one executed transition.
///
/// Append-only: records are never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub transition_id: TransitionId,
    pub previous_status: StatusId,
    pub new_status: StatusId,
    pub executed_by: String,
    pub executed_at: DateTime<Utc>,
    pub comments: Option<String>,
}

/// One run of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Unique identifier for this run
    pub id: Uuid,

    /// The workflow definition this instance executes
    pub workflow_id: WorkflowId,

    /// Caller-supplied or engine-generated unique business label
    pub business_key: String,

    /// Fine-grained position inside the graph; always a status belonging
    /// to `workflow_id`
    pub current_status: StatusId,

    /// Coarse lifecycle state
    pub state: InstanceState,

    pub start_date: DateTime<Utc>,

    /// Set exactly once, when the instance enters a FINAL status
    pub end_date: Option<DateTime<Utc>>,

    pub created_by: String,

    /// Append-only transition history, oldest first
    pub history: Vec<TransitionRecord>,

    /// Typed business data scoped to this instance
    pub variables: Vec<Variable>,
}

impl Instance {
    /// Create a fresh instance positioned at the workflow's initial status.
    pub fn new<W, B, C>(workflow_id: W, business_key: B, initial_status: StatusId, created_by: C) -> Self
    where
        W: Into<WorkflowId>,
        B: Into<String>,
        C: Into<String>,
    {
        Instance {
            id: Uuid::new_v4(),
            workflow_id: workflow_id.into(),
            business_key: business_key.into(),
            current_status: initial_status,
            state: InstanceState::Created,
            start_date: Utc::now(),
            end_date: None,
            created_by: created_by.into(),
            history: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Whether the instance has reached a FINAL status.
    pub fn is_completed(&self) -> bool {
        self.state == InstanceState::Completed
    }

    /// Apply a transition: append the history row, move `current_status`,
    /// and roll the lifecycle state forward.
    ///
    /// `target_is_final` is decided by the caller against the workflow
    /// graph; when true the instance completes and `end_date` is stamped.
    /// The engine persists the mutated instance as one atomic write so the
    /// status change and its history row commit together.
    pub fn apply_transition(
        &mut self,
        transition: &Transition,
        target_is_final: bool,
        executed_by: &str,
    ) {
        let now = Utc::now();
        self.history.push(TransitionRecord {
            transition_id: transition.id.clone(),
            previous_status: self.current_status.clone(),
            new_status: transition.target.clone(),
            executed_by: executed_by.to_string(),
            executed_at: now,
            comments: None,
        });

        self.current_status = transition.target.clone();
        if target_is_final {
            self.state = InstanceState::Completed;
            self.end_date = Some(now);
        } else {
            self.state = InstanceState::InProgress;
        }
    }

    /// The most recent history row, if any transition has fired.
    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.history.last()
    }

    /// Set or replace a variable by name.
    pub fn set_variable<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<VariableValue>,
    {
        let name = name.into();
        let value = value.into();
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.value = value,
            None => self.variables.push(Variable { name, value }),
        }
    }

    /// Look up a variable value by name.
    pub fn variable(&self, name: &str) -> Option<&VariableValue> {
        self.variables.iter().find(|v| v.name == name).map(|v| &v.value)
    }
}
