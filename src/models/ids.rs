// Identifier newtypes for workflow graph elements

//! # Graph Identifiers
//!
//! Every graph element is addressed by a string identifier wrapped in its own
//! newtype, so a transition id can never be passed where a status id is
//! expected. Identifiers are caller-chosen, human-readable labels
//! ("draft", "submit", "approval_gate") rather than generated surrogates.

use serde::{Deserialize, Serialize};

/// Identifier of a [`Workflow`](super::Workflow) definition.
///
/// ```rust
/// # use trellis::WorkflowId;
/// let id = WorkflowId::from("document_review");
/// assert_eq!(id.as_str(), "document_review");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

/// Identifier of a [`Status`](super::Status) within a workflow.
///
/// Statuses are the states an instance can occupy: "draft", "review",
/// "approved". The id is unique within its workflow, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusId(pub String);

/// Identifier of a [`Transition`](super::Transition) within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub String);

/// Identifier of a [`Gateway`](super::Gateway) within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatewayId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Create a new identifier from any string-like input
            pub fn new<S: Into<String>>(value: S) -> Self {
                $name(value.into())
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(WorkflowId);
string_id!(StatusId);
string_id!(TransitionId);
string_id!(GatewayId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_construction_paths_agree() {
        let a = StatusId::from("draft");
        let b = StatusId::from("draft".to_string());
        let c = StatusId::new("draft");
        let d = StatusId("draft".to_string());

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a.as_str(), "draft");
        assert_eq!(a.to_string(), "draft");
    }

    #[test]
    fn ids_of_different_kinds_are_distinct_types() {
        // Compile-time property really, but keep the values honest too
        let status = StatusId::from("review");
        let transition = TransitionId::from("review");
        assert_eq!(status.as_str(), transition.as_str());
    }
}
