// Trellis engine - execution, guards, export, storage, monitoring

//! # Engine Module
//!
//! Everything that *does* something with a workflow definition:
//!
//! - [`storage`]: the persistence boundary ([`WorkflowStore`] trait) and the
//!   in-memory backend
//! - [`guards`]: the condition evaluator - how inline guard expressions and
//!   attached conditions combine into one pass/fail decision
//! - [`executor`]: the transition engine driving instances through the graph
//! - [`bpmn`]: deterministic BPMN 2.0 export of the graph and its flows
//! - [`tasks`]: the status-entry hook and work-item bookkeeping
//! - [`events`]: broadcast bus for instance lifecycle events
//! - [`monitor`]: aggregate statistics over workflows, instances, and tasks
//!
//! [`WorkflowStore`]: storage::WorkflowStore

pub mod bpmn;
pub mod events;
pub mod executor;
pub mod guards;
pub mod monitor;
pub mod storage;
pub mod tasks;

pub use bpmn::BpmnExporter;
pub use events::{EventBus, WorkflowEvent, WorkflowEventKind};
pub use executor::{EngineConfig, TransitionEngine};
pub use guards::{ExpressionEvaluator, GuardContext, GuardEvaluator, MarkerEvaluator};
pub use monitor::{Dashboard, InstanceDetails, Monitor, WorkflowReport};
pub use storage::{InMemoryStore, WorkflowStore};
pub use tasks::{StatusHook, TaskService};
