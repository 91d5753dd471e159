// Status-entry hook and work-item bookkeeping

//! # Task Hook and Service
//!
//! When an instance enters a non-final status, the transition engine calls
//! the [`StatusHook`]. The hook is best-effort by contract: the engine logs
//! a failure and moves on, so implementations must expect that a raised
//! error does not undo the transition that triggered them.
//!
//! [`TaskService`] is the shipped hook implementation: it records a work
//! item for the entered status ("Process: {status name}", due in 24 hours,
//! normal priority) and offers the assignment/completion bookkeeping around
//! it.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::storage::WorkflowStore;
use crate::models::{Instance, Status, Task, TaskStatus};
use crate::{Result, TrellisError};

/// Hook invoked by the transition engine after every non-final transition.
///
/// Implementations must tolerate being fire-and-forget: a returned error is
/// logged by the engine and never propagated to the caller that executed
/// the transition.
#[async_trait::async_trait]
pub trait StatusHook: Send + Sync {
    async fn on_status_entered(
        &self,
        instance: &Instance,
        status: &Status,
        actor: &str,
    ) -> Result<()>;
}

/// Default due-date horizon for freshly created work items.
const DEFAULT_DUE_HOURS: i64 = 24;

/// Normal priority on the 1..=10 scale used by work items.
const DEFAULT_PRIORITY: i32 = 5;

/// Store-backed work-item service; also the default [`StatusHook`].
pub struct TaskService {
    store: Arc<dyn WorkflowStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        TaskService { store }
    }

    /// Create the work item for an instance entering a status.
    pub async fn create_task_for_status(
        &self,
        instance: &Instance,
        status: &Status,
        assignee: &str,
    ) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            instance_id: instance.id,
            status_id: status.id.clone(),
            name: format!("Process: {}", status.name),
            description: Some(format!(
                "Work item for {} at status {}",
                instance.business_key, status.name
            )),
            state: TaskStatus::Created,
            assignee: Some(assignee.to_string()),
            created_at: now,
            due_date: Some(now + Duration::hours(DEFAULT_DUE_HOURS)),
            priority: DEFAULT_PRIORITY,
            comments: None,
        };
        self.store.create_task(task).await
    }

    /// Reassign a work item.
    pub async fn assign_task(&self, task_id: &Uuid, assignee: &str) -> Result<Task> {
        let mut task = self.load_task(task_id).await?;
        task.assignee = Some(assignee.to_string());
        task.state = TaskStatus::Assigned;
        self.store.update_task(task).await
    }

    /// Complete a work item. Only the current assignee may complete it.
    pub async fn complete_task(
        &self,
        task_id: &Uuid,
        completed_by: &str,
        comments: Option<String>,
    ) -> Result<Task> {
        let mut task = self.load_task(task_id).await?;
        if task.assignee.as_deref() != Some(completed_by) {
            return Err(TrellisError::InvalidInput(format!(
                "task {} can only be completed by its assignee",
                task_id
            )));
        }
        task.state = TaskStatus::Completed;
        task.comments = comments;
        self.store.update_task(task).await
    }

    /// Cancel a work item regardless of assignment.
    pub async fn cancel_task(&self, task_id: &Uuid) -> Result<Task> {
        let mut task = self.load_task(task_id).await?;
        task.state = TaskStatus::Cancelled;
        self.store.update_task(task).await
    }

    /// Work items belonging to one instance.
    pub async fn tasks_for_instance(&self, instance_id: &Uuid) -> Result<Vec<Task>> {
        self.store.list_tasks(Some(instance_id)).await
    }

    /// Work items assigned to one user.
    pub async fn tasks_for_user(&self, assignee: &str) -> Result<Vec<Task>> {
        self.store.tasks_for_assignee(assignee).await
    }

    async fn load_task(&self, task_id: &Uuid) -> Result<Task> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or(TrellisError::TaskNotFound { id: *task_id })
    }
}

#[async_trait::async_trait]
impl StatusHook for TaskService {
    async fn on_status_entered(
        &self,
        instance: &Instance,
        status: &Status,
        actor: &str,
    ) -> Result<()> {
        let task = self.create_task_for_status(instance, status, actor).await?;
        debug!(
            task = %task.id,
            instance = %instance.id,
            status = %status.id,
            "work item created on status entry"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::executor::TransitionEngine;
    use crate::engine::storage::InMemoryStore;
    use crate::models::{StatusId, StatusKind, Transition, Workflow};

    /// Hook that always fails; exercises the engine's swallow-and-log path.
    struct FailingHook;

    #[async_trait::async_trait]
    impl StatusHook for FailingHook {
        async fn on_status_entered(&self, _: &Instance, _: &Status, _: &str) -> Result<()> {
            Err(anyhow::anyhow!("task backend unavailable").into())
        }
    }

    fn review_workflow() -> Workflow {
        let mut workflow = Workflow::new("review", "Review", "tests");
        workflow.add_status(Status::new("draft", "Draft", StatusKind::Initial, 1));
        workflow.add_status(Status::new("review", "Review", StatusKind::Normal, 2));
        workflow.add_status(Status::new("done", "Done", StatusKind::Final, 3));
        workflow.add_transition(Transition::new("submit", "draft", "review"));
        workflow.add_transition(Transition::new("approve", "review", "done"));
        workflow
    }

    async fn setup() -> (Arc<InMemoryStore>, TransitionEngine, TaskService) {
        let store = Arc::new(InMemoryStore::new());
        store.create_workflow(review_workflow()).await.unwrap();
        let service = TaskService::new(store.clone());
        let engine = TransitionEngine::new(store.clone())
            .with_hook(Arc::new(TaskService::new(store.clone())));
        (store, engine, service)
    }

    #[tokio::test]
    async fn non_final_entry_creates_a_task_final_does_not() {
        let (_, engine, service) = setup().await;
        let instance = engine
            .start_workflow(&"review".into(), Some("DOC-1".into()), "alice")
            .await
            .unwrap();

        let instance = engine
            .execute_transition(&instance.id, &"submit".into(), "bob")
            .await
            .unwrap();
        let tasks = service.tasks_for_instance(&instance.id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Process: Review");
        assert_eq!(tasks[0].status_id, StatusId::from("review"));
        assert_eq!(tasks[0].assignee.as_deref(), Some("bob"));
        assert_eq!(tasks[0].priority, 5);

        // Entering the FINAL status must not spawn another work item
        let instance = engine
            .execute_transition(&instance.id, &"approve".into(), "bob")
            .await
            .unwrap();
        let tasks = service.tasks_for_instance(&instance.id).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn hook_failure_never_rolls_back_the_transition() {
        let store = Arc::new(InMemoryStore::new());
        store.create_workflow(review_workflow()).await.unwrap();
        let engine = TransitionEngine::new(store.clone()).with_hook(Arc::new(FailingHook));

        let instance = engine
            .start_workflow(&"review".into(), None, "alice")
            .await
            .unwrap();
        let instance = engine
            .execute_transition(&instance.id, &"submit".into(), "alice")
            .await
            .unwrap();

        // Transition stands despite the failing hook
        assert_eq!(instance.current_status.as_str(), "review");
        assert_eq!(instance.history.len(), 1);
    }

    #[tokio::test]
    async fn only_the_assignee_completes_a_task() {
        let (_, engine, service) = setup().await;
        let instance = engine
            .start_workflow(&"review".into(), None, "alice")
            .await
            .unwrap();
        let instance = engine
            .execute_transition(&instance.id, &"submit".into(), "bob")
            .await
            .unwrap();

        let task = &service.tasks_for_instance(&instance.id).await.unwrap()[0];

        let err = service
            .complete_task(&task.id, "mallory", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TrellisError::InvalidInput(_)));

        let done = service
            .complete_task(&task.id, "bob", Some("looks good".into()))
            .await
            .unwrap();
        assert_eq!(done.state, TaskStatus::Completed);
        assert_eq!(done.comments.as_deref(), Some("looks good"));
    }

    #[tokio::test]
    async fn assignment_moves_task_between_users() {
        let (_, engine, service) = setup().await;
        let instance = engine
            .start_workflow(&"review".into(), None, "alice")
            .await
            .unwrap();
        engine
            .execute_transition(&instance.id, &"submit".into(), "bob")
            .await
            .unwrap();

        let task = &service.tasks_for_instance(&instance.id).await.unwrap()[0];
        let task = service.assign_task(&task.id, "carol").await.unwrap();
        assert_eq!(task.state, TaskStatus::Assigned);

        assert_eq!(service.tasks_for_user("carol").await.unwrap().len(), 1);
        assert!(service.tasks_for_user("bob").await.unwrap().is_empty());
    }
}
