// Storage abstraction for workflows, instances, and tasks

//! # Storage Abstraction Layer
//!
//! The persistence boundary of the engine. [`WorkflowStore`] defines what
//! the engine needs from a backend:
//!
//! - load a workflow definition with its full status/transition/gateway
//!   graph by id
//! - load and save instances with their history and variables
//! - commit an instance update **atomically**: the status change, the
//!   appended history row, and the terminal-state flags must land as one
//!   unit of work, so a crash can never leave `current_status` updated
//!   without its matching history row or vice versa
//! - CRUD for the work items the status-entry hook creates
//!
//! All operations are async so database- and network-backed stores fit the
//! same trait. [`InMemoryStore`] is the default backend for development and
//! tests: `RwLock`-guarded hash maps, where the atomic instance commit is a
//! single map insert under the write lock.

use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::{Instance, Task, Workflow, WorkflowId};
use crate::Result;

/// Storage trait for workflow, instance, and task persistence.
///
/// Get operations return `Result<Option<T>>`: the lookup itself can fail
/// (backend unavailable), and separately the entity may simply not exist.
/// Callers that require existence map `None` to the matching `NotFound`
/// error kind.
#[async_trait::async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Store a new workflow definition.
    async fn create_workflow(&self, workflow: Workflow) -> Result<Workflow>;

    /// Load a workflow definition with its complete graph.
    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>>;

    /// List all workflow definitions.
    async fn list_workflows(&self) -> Result<Vec<Workflow>>;

    /// Store a newly started instance.
    async fn create_instance(&self, instance: Instance) -> Result<Instance>;

    /// Load an instance with its history and variables.
    async fn get_instance(&self, id: &Uuid) -> Result<Option<Instance>>;

    /// Persist an updated instance as one atomic unit of work.
    ///
    /// This is the commit point of a transition: the new current status,
    /// the appended history row, and any terminal-state flags arrive
    /// together in the passed value and must be made durable together.
    async fn update_instance(&self, instance: Instance) -> Result<Instance>;

    /// List instances, optionally filtered by workflow.
    async fn list_instances(&self, workflow_id: Option<&WorkflowId>) -> Result<Vec<Instance>>;

    /// Store a new work item.
    async fn create_task(&self, task: Task) -> Result<Task>;

    /// Load a work item by id.
    async fn get_task(&self, id: &Uuid) -> Result<Option<Task>>;

    /// Persist an updated work item.
    async fn update_task(&self, task: Task) -> Result<Task>;

    /// List work items, optionally filtered by instance.
    async fn list_tasks(&self, instance_id: Option<&Uuid>) -> Result<Vec<Task>>;

    /// List work items assigned to a user.
    async fn tasks_for_assignee(&self, assignee: &str) -> Result<Vec<Task>>;
}

/// In-memory storage for development, demos, and tests.
///
/// Not persistent and not distributed; data lives as long as the process.
/// Reader-writer locks give safe concurrent access from async tasks, and a
/// poisoned lock surfaces as a storage error instead of a panic.
#[derive(Default)]
pub struct InMemoryStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
    instances: RwLock<HashMap<Uuid, Instance>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("store lock poisoned").into())
}

fn write<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("store lock poisoned").into())
}

#[async_trait::async_trait]
impl WorkflowStore for InMemoryStore {
    async fn create_workflow(&self, workflow: Workflow) -> Result<Workflow> {
        let mut workflows = write(&self.workflows)?;
        workflows.insert(workflow.id.clone(), workflow.clone());
        Ok(workflow)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>> {
        let workflows = read(&self.workflows)?;
        Ok(workflows.get(id).cloned())
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let workflows = read(&self.workflows)?;
        Ok(workflows.values().cloned().collect())
    }

    async fn create_instance(&self, instance: Instance) -> Result<Instance> {
        let mut instances = write(&self.instances)?;
        instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn get_instance(&self, id: &Uuid) -> Result<Option<Instance>> {
        let instances = read(&self.instances)?;
        Ok(instances.get(id).cloned())
    }

    async fn update_instance(&self, instance: Instance) -> Result<Instance> {
        // Single insert under the write lock: the in-memory form of the
        // atomic state + history commit.
        let mut instances = write(&self.instances)?;
        instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn list_instances(&self, workflow_id: Option<&WorkflowId>) -> Result<Vec<Instance>> {
        let instances = read(&self.instances)?;
        Ok(instances
            .values()
            .filter(|i| workflow_id.map_or(true, |wid| &i.workflow_id == wid))
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: Task) -> Result<Task> {
        let mut tasks = write(&self.tasks)?;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: &Uuid) -> Result<Option<Task>> {
        let tasks = read(&self.tasks)?;
        Ok(tasks.get(id).cloned())
    }

    async fn update_task(&self, task: Task) -> Result<Task> {
        let mut tasks = write(&self.tasks)?;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, instance_id: Option<&Uuid>) -> Result<Vec<Task>> {
        let tasks = read(&self.tasks)?;
        Ok(tasks
            .values()
            .filter(|t| instance_id.map_or(true, |iid| &t.instance_id == iid))
            .cloned()
            .collect())
    }

    async fn tasks_for_assignee(&self, assignee: &str) -> Result<Vec<Task>> {
        let tasks = read(&self.tasks)?;
        Ok(tasks
            .values()
            .filter(|t| t.assignee.as_deref() == Some(assignee))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Status, StatusId, StatusKind};

    fn sample_workflow(id: &str) -> Workflow {
        let mut workflow = Workflow::new(id, "Sample", "tests");
        workflow.add_status(Status::new("start", "Start", StatusKind::Initial, 1));
        workflow
    }

    #[tokio::test]
    async fn workflow_round_trip() {
        let store = InMemoryStore::new();
        store.create_workflow(sample_workflow("wf1")).await.unwrap();

        let loaded = store.get_workflow(&WorkflowId::from("wf1")).await.unwrap();
        assert_eq!(loaded.unwrap().name, "Sample");

        let missing = store.get_workflow(&WorkflowId::from("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn instance_update_replaces_previous_state() {
        let store = InMemoryStore::new();
        let mut instance =
            Instance::new("wf1", "KEY-1", StatusId::from("start"), "tests");
        store.create_instance(instance.clone()).await.unwrap();

        instance.set_variable("round", 2.0);
        store.update_instance(instance.clone()).await.unwrap();

        let loaded = store.get_instance(&instance.id).await.unwrap().unwrap();
        assert_eq!(loaded.variables.len(), 1);
    }

    #[tokio::test]
    async fn instance_listing_filters_by_workflow() {
        let store = InMemoryStore::new();
        let a = Instance::new("wf_a", "A-1", StatusId::from("start"), "tests");
        let b = Instance::new("wf_b", "B-1", StatusId::from("start"), "tests");
        store.create_instance(a).await.unwrap();
        store.create_instance(b).await.unwrap();

        let all = store.list_instances(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_a = store
            .list_instances(Some(&WorkflowId::from("wf_a")))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].business_key, "A-1");
    }
}
