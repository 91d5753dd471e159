// Status nodes - the states an instance can occupy

//! # Status Model
//!
//! A [`Status`] is a node in the workflow graph. Its [`StatusKind`] is a
//! closed enum: exactly one `Initial` status anchors instance creation, any
//! number of `Normal` statuses form the body of the process, and reaching a
//! `Final` status completes the instance. `position` is a display and
//! default-ordering hint; once explicit transitions exist it carries no
//! execution meaning.

use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionTarget};
use super::ids::StatusId;

/// Role of a status within the workflow graph.
///
/// Modeled as a closed enum so new kinds cannot silently fall through
/// `match` arms. Serialized in the upper-case wire form
/// (`"INITIAL"` / `"NORMAL"` / `"FINAL"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    /// Entry point of the graph; instances are created here
    Initial,
    /// Ordinary in-progress state
    Normal,
    /// Terminal state; entering it completes the instance
    Final,
}

impl StatusKind {
    /// Whether an instance entering this status is done.
    pub fn is_final(self) -> bool {
        matches!(self, StatusKind::Final)
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusKind::Initial => "INITIAL",
            StatusKind::Normal => "NORMAL",
            StatusKind::Final => "FINAL",
        };
        write!(f, "{label}")
    }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Identifier, unique within the owning workflow
    pub id: StatusId,

    /// Human-readable name shown in diagrams and work items
    pub name: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Role of this status in the graph
    pub kind: StatusKind,

    /// Display/default-ordering hint along the left-to-right axis
    pub position: i32,

    /// Condition records attached to this status. Annotations for external
    /// tooling; the engine only evaluates transition-attached conditions.
    pub conditions: Vec<Condition>,
}

impl Status {
    /// Create a new status.
    ///
    /// ```rust
    /// # use trellis::{Status, StatusKind};
    /// let draft = Status::new("draft", "Draft", StatusKind::Initial, 1);
    /// assert!(draft.description.is_none());
    /// ```
    pub fn new<I, N>(id: I, name: N, kind: StatusKind, position: i32) -> Self
    where
        I: Into<StatusId>,
        N: Into<String>,
    {
        Status {
            id: id.into(),
            name: name.into(),
            description: None,
            kind,
            position,
            conditions: Vec::new(),
        }
    }

    /// Attach a description, builder-style.
    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a condition record to this status. The attachment tag is
    /// rewritten to point at this status.
    pub fn add_condition(&mut self, mut condition: Condition) {
        condition.attached_to = ConditionTarget::Status(self.id.clone());
        self.conditions.push(condition);
    }
}
