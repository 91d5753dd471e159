// Aggregate statistics over workflows, instances, and tasks

//! # Monitoring
//!
//! Read-only reporting over the store: a global dashboard, a per-workflow
//! report, and per-instance details with duration and a coarse progress
//! estimate. Everything here is serde-serializable so callers can ship the
//! reports straight to an API layer or a log sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::storage::WorkflowStore;
use crate::models::{Instance, InstanceState, StatusId, StatusKind, Workflow, WorkflowId};
use crate::{Result, TrellisError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstanceCounts {
    pub total: usize,
    pub created: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl InstanceCounts {
    fn tally(instances: &[Instance]) -> Self {
        let mut counts = InstanceCounts {
            total: instances.len(),
            ..Default::default()
        };
        for instance in instances {
            match instance.state {
                InstanceState::Created => counts.created += 1,
                InstanceState::InProgress => counts.in_progress += 1,
                InstanceState::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub open: usize,
    pub overdue: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowCounts {
    pub total: usize,
    pub active: usize,
}

/// Global statistics across every workflow in the store.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub instances: InstanceCounts,
    pub tasks: TaskCounts,
    pub workflows: WorkflowCounts,
    pub generated_at: DateTime<Utc>,
}

impl Dashboard {
    /// Pretty-printed JSON form, ready for an API response or log line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Statistics for one workflow plus details of its unfinished instances.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub workflow_id: WorkflowId,
    pub name: String,
    pub active: bool,
    pub instances: InstanceCounts,
    pub running: Vec<InstanceDetails>,
    pub generated_at: DateTime<Utc>,
}

/// A monitoring view of one instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceDetails {
    pub id: Uuid,
    pub business_key: String,
    pub workflow_id: WorkflowId,
    pub state: InstanceState,
    pub current_status: StatusId,
    pub current_status_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    /// Coarse estimate from the current status kind:
    /// INITIAL 10, NORMAL 50, FINAL 100
    pub progress_percent: u8,
}

impl InstanceDetails {
    fn build(instance: &Instance, workflow: Option<&Workflow>, now: DateTime<Utc>) -> Self {
        let status = workflow.and_then(|w| w.find_status(&instance.current_status));
        let progress = match status.map(|s| s.kind) {
            Some(StatusKind::Initial) => 10,
            Some(StatusKind::Normal) => 50,
            Some(StatusKind::Final) => 100,
            None => 25,
        };
        let until = instance.end_date.unwrap_or(now);

        InstanceDetails {
            id: instance.id,
            business_key: instance.business_key.clone(),
            workflow_id: instance.workflow_id.clone(),
            state: instance.state,
            current_status: instance.current_status.clone(),
            current_status_name: status.map(|s| s.name.clone()),
            started_at: instance.start_date,
            ended_at: instance.end_date,
            duration_minutes: (until - instance.start_date).num_minutes(),
            progress_percent: progress,
        }
    }
}

/// Read-only reporting facade over a [`WorkflowStore`].
pub struct Monitor {
    store: Arc<dyn WorkflowStore>,
}

impl Monitor {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Monitor { store }
    }

    /// Global counts across all workflows, instances, and tasks.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let now = Utc::now();
        let instances = self.store.list_instances(None).await?;
        let tasks = self.store.list_tasks(None).await?;
        let workflows = self.store.list_workflows().await?;

        let open = tasks.iter().filter(|t| t.is_open()).count();
        let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();

        Ok(Dashboard {
            instances: InstanceCounts::tally(&instances),
            tasks: TaskCounts {
                total: tasks.len(),
                open,
                overdue,
                completed: tasks.len() - open,
            },
            workflows: WorkflowCounts {
                total: workflows.len(),
                active: workflows.iter().filter(|w| w.active).count(),
            },
            generated_at: now,
        })
    }

    /// Counts plus unfinished-instance details for one workflow.
    pub async fn workflow_report(&self, workflow_id: &WorkflowId) -> Result<WorkflowReport> {
        let now = Utc::now();
        let workflow = self
            .store
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| TrellisError::WorkflowNotFound {
                id: workflow_id.to_string(),
            })?;
        let instances = self.store.list_instances(Some(workflow_id)).await?;

        let running = instances
            .iter()
            .filter(|i| !i.is_completed())
            .map(|i| InstanceDetails::build(i, Some(&workflow), now))
            .collect();

        Ok(WorkflowReport {
            workflow_id: workflow.id.clone(),
            name: workflow.name.clone(),
            active: workflow.active,
            instances: InstanceCounts::tally(&instances),
            running,
            generated_at: now,
        })
    }

    /// Monitoring view of a single instance.
    pub async fn instance_details(&self, instance_id: &Uuid) -> Result<InstanceDetails> {
        let instance = self
            .store
            .get_instance(instance_id)
            .await?
            .ok_or(TrellisError::InstanceNotFound { id: *instance_id })?;
        let workflow = self.store.get_workflow(&instance.workflow_id).await?;
        Ok(InstanceDetails::build(
            &instance,
            workflow.as_ref(),
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::executor::TransitionEngine;
    use crate::engine::storage::InMemoryStore;
    use crate::models::{Status, Transition};

    fn linear_workflow(id: &str) -> Workflow {
        let mut workflow = Workflow::new(id, "Linear", "tests");
        workflow.add_status(Status::new("a", "A", StatusKind::Initial, 1));
        workflow.add_status(Status::new("b", "B", StatusKind::Normal, 2));
        workflow.add_status(Status::new("c", "C", StatusKind::Final, 3));
        workflow.add_transition(Transition::new("to_b", "a", "b"));
        workflow.add_transition(Transition::new("to_c", "b", "c"));
        workflow
    }

    #[tokio::test]
    async fn dashboard_partitions_instances_by_state() {
        let store = Arc::new(InMemoryStore::new());
        store.create_workflow(linear_workflow("wf")).await.unwrap();
        let engine = TransitionEngine::new(store.clone());

        // One created, one in progress, one completed
        engine.start_workflow(&"wf".into(), None, "t").await.unwrap();
        let moving = engine.start_workflow(&"wf".into(), None, "t").await.unwrap();
        engine
            .execute_transition(&moving.id, &"to_b".into(), "t")
            .await
            .unwrap();
        engine.run_workflow(&"wf".into(), None, "t").await.unwrap();

        let monitor = Monitor::new(store);
        let dashboard = monitor.dashboard().await.unwrap();
        assert_eq!(dashboard.instances.total, 3);
        assert_eq!(dashboard.instances.created, 1);
        assert_eq!(dashboard.instances.in_progress, 1);
        assert_eq!(dashboard.instances.completed, 1);
        assert_eq!(dashboard.workflows.total, 1);
        assert_eq!(dashboard.workflows.active, 1);
        assert!(dashboard.to_json().unwrap().contains("\"completed\": 1"));
    }

    #[tokio::test]
    async fn workflow_report_lists_only_unfinished_instances() {
        let store = Arc::new(InMemoryStore::new());
        store.create_workflow(linear_workflow("wf")).await.unwrap();
        let engine = TransitionEngine::new(store.clone());

        let open = engine
            .start_workflow(&"wf".into(), Some("OPEN-1".into()), "t")
            .await
            .unwrap();
        engine.run_workflow(&"wf".into(), None, "t").await.unwrap();

        let monitor = Monitor::new(store);
        let report = monitor.workflow_report(&"wf".into()).await.unwrap();
        assert_eq!(report.instances.total, 2);
        assert_eq!(report.running.len(), 1);
        assert_eq!(report.running[0].id, open.id);
        assert_eq!(report.running[0].progress_percent, 10);
    }

    #[tokio::test]
    async fn instance_details_report_progress_by_status_kind() {
        let store = Arc::new(InMemoryStore::new());
        store.create_workflow(linear_workflow("wf")).await.unwrap();
        let engine = TransitionEngine::new(store.clone());
        let monitor = Monitor::new(store);

        let instance = engine.start_workflow(&"wf".into(), None, "t").await.unwrap();
        assert_eq!(
            monitor.instance_details(&instance.id).await.unwrap().progress_percent,
            10
        );

        engine
            .execute_transition(&instance.id, &"to_b".into(), "t")
            .await
            .unwrap();
        assert_eq!(
            monitor.instance_details(&instance.id).await.unwrap().progress_percent,
            50
        );

        engine.auto_advance(&instance.id, "t").await.unwrap();
        let details = monitor.instance_details(&instance.id).await.unwrap();
        assert_eq!(details.progress_percent, 100);
        assert!(details.ended_at.is_some());
    }

    #[tokio::test]
    async fn unknown_ids_surface_not_found() {
        let monitor = Monitor::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            monitor.workflow_report(&"ghost".into()).await.unwrap_err(),
            TrellisError::WorkflowNotFound { .. }
        ));
        assert!(matches!(
            monitor.instance_details(&Uuid::new_v4()).await.unwrap_err(),
            TrellisError::InstanceNotFound { .. }
        ));
    }
}
