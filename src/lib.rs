// Trellis - workflow definition graphs and their execution engine

//! # Trellis Library
//!
//! Trellis models business processes as typed finite-state graphs. A
//! [`Workflow`] is a named, versioned graph of [`Status`] nodes connected by
//! guarded [`Transition`] edges (plus display-only [`Gateway`] branch points).
//! Each workflow is instantiated many times over as independent [`Instance`]s
//! that advance from status to status under explicit commands, recording an
//! immutable transition history along the way.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Workflow`]: the status/transition/gateway graph plus validation
//! - [`Status`] / [`Transition`] / [`Gateway`] / [`Condition`]: graph elements
//! - [`Instance`]: one run of a workflow, with history and variables
//!
//! ### Engine
//! - [`TransitionEngine`]: validates and applies transitions, appends history,
//!   fires the status-entry hook, and emits events
//! - [`GuardEvaluator`]: combines inline guard expressions and attached
//!   conditions into a single pass/fail decision
//! - [`BpmnExporter`]: deterministic BPMN 2.0 serialization of the graph
//! - [`WorkflowStore`]: the persistence boundary, with [`InMemoryStore`] as
//!   the default backend
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis::{
//!     InMemoryStore, Status, StatusKind, Transition, TransitionEngine, Workflow,
//!     WorkflowStore,
//! };
//!
//! # tokio_test::block_on(async {
//! let mut workflow = Workflow::new("order_fulfillment", "Order Fulfillment", "demo");
//! workflow.add_status(Status::new("new", "New", StatusKind::Initial, 1));
//! workflow.add_status(Status::new("shipped", "Shipped", StatusKind::Final, 2));
//! workflow.add_transition(Transition::new("ship", "new", "shipped"));
//!
//! let store = Arc::new(InMemoryStore::default());
//! store.create_workflow(workflow).await.unwrap();
//!
//! let engine = TransitionEngine::new(store);
//! let instance = engine
//!     .start_workflow(&"order_fulfillment".into(), None, "alice")
//!     .await
//!     .unwrap();
//! assert_eq!(instance.current_status.as_str(), "new");
//! # });
//! ```

// Core domain models (pure data plus graph validation)
pub mod models;

// Engine implementations (execution, guards, export, storage, monitoring)
pub mod engine;

// Re-export core domain types for easy access from the crate root
pub use models::{
    Condition,        // Guard record attached to a status or transition
    ConditionTarget,  // Which entity a condition is attached to
    Gateway,          // Display-only branch point
    GatewayId,        // Gateway identifier
    GatewayKind,      // Exclusive / parallel display tag
    Instance,         // One run of a workflow
    InstanceState,    // Created / InProgress / Completed
    Status,           // A node in the workflow graph
    StatusId,         // Status identifier
    StatusKind,       // Initial / Normal / Final
    Task,             // Work item spawned on status entry
    TaskStatus,       // Work item lifecycle state
    Transition,       // Directed, optionally guarded edge
    TransitionId,     // Transition identifier
    TransitionRecord, // Immutable history row
    ValidationReport, // Errors and warnings from graph validation
    Variable,         // Typed business data scoped to an instance
    VariableKind,     // Closed set of variable types
    VariableValue,    // The typed payload itself
    Workflow,         // The workflow definition graph
    WorkflowId,       // Workflow identifier
};

// Re-export engine types for convenience
pub use engine::{
    bpmn::BpmnExporter,
    events::{EventBus, WorkflowEvent, WorkflowEventKind},
    executor::{EngineConfig, TransitionEngine},
    guards::{ExpressionEvaluator, GuardContext, GuardEvaluator, MarkerEvaluator},
    monitor::{Dashboard, InstanceDetails, Monitor, WorkflowReport},
    storage::{InMemoryStore, WorkflowStore},
    tasks::{StatusHook, TaskService},
};

use thiserror::Error;
use uuid::Uuid;

/// Error type for all Trellis operations.
///
/// Every user-visible failure carries its kind and the offending identifiers;
/// the engine never surfaces a partially-applied state. `HookFailed` is the
/// one recovered-locally kind: the transition engine logs it and lets the
/// state change stand.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// A workflow id did not resolve
    #[error("workflow not found: {id}")]
    WorkflowNotFound { id: String },

    /// An instance id did not resolve
    #[error("instance not found: {id}")]
    InstanceNotFound { id: Uuid },

    /// A transition id did not resolve within the instance's workflow
    #[error("transition not found: {id}")]
    TransitionNotFound { id: String },

    /// A status id did not resolve within the workflow
    #[error("status not found: {id}")]
    StatusNotFound { id: String },

    /// A work item id did not resolve
    #[error("task not found: {id}")]
    TaskNotFound { id: Uuid },

    /// The workflow graph cannot be executed as defined: missing or
    /// ambiguous INITIAL status, no FINAL status, dangling transition
    /// endpoint, orphan condition
    #[error("workflow {workflow} has an invalid graph: {reason}")]
    GraphInvalid { workflow: String, reason: String },

    /// The requested transition cannot fire from the instance's
    /// current position, or the instance has already completed
    #[error("invalid transition {transition} on instance {instance}: {reason}")]
    InvalidTransition {
        instance: Uuid,
        transition: String,
        reason: String,
    },

    /// Guard evaluation rejected the transition (only raised by the
    /// guard-enforcing execution path; the plain path never checks)
    #[error("guard rejected transition {transition}")]
    GuardFailed { transition: String },

    /// The status-entry hook raised; logged by the engine, never propagated
    /// out of a transition
    #[error("status hook failed: {0}")]
    HookFailed(String),

    /// Invalid caller-supplied input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors, kept opaque so backends can wrap freely
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// JSON serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Results that use [`TrellisError`].
pub type Result<T> = std::result::Result<T, TrellisError>;
