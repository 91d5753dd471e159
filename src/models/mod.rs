// Core domain models for Trellis
// Pure data structures plus graph validation - no execution behavior

//! # Domain Models Module
//!
//! The workflow definition graph and everything that hangs off it. These
//! types carry no engine behavior beyond validation and read-only queries;
//! execution lives in [`crate::engine`].
//!
//! - [`ids`]: string newtype identifiers for graph elements
//! - [`status`] / [`transition`] / [`gateway`] / [`condition`]: graph parts
//! - [`workflow`]: the aggregate graph with validation and queries
//! - [`instance`]: one run of a workflow, with its history
//! - [`variable`]: typed per-instance business data
//! - [`task`]: work items spawned when an instance enters a status

pub mod condition;
pub mod gateway;
pub mod ids;
pub mod instance;
pub mod status;
pub mod task;
pub mod transition;
pub mod variable;
pub mod workflow;

pub use condition::{Condition, ConditionTarget};
pub use gateway::{Gateway, GatewayKind};
pub use ids::{GatewayId, StatusId, TransitionId, WorkflowId};
pub use instance::{Instance, InstanceState, TransitionRecord};
pub use status::{Status, StatusKind};
pub use task::{Task, TaskStatus};
pub use transition::Transition;
pub use variable::{Variable, VariableKind, VariableValue};
pub use workflow::{ValidationReport, Workflow};
