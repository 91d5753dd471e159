// Work items spawned when an instance enters a status

//! # Task Model
//!
//! A [`Task`] is the work item the engine's status-entry hook creates for
//! every non-final status an instance lands on. Assignment and completion
//! bookkeeping lives in [`crate::engine::tasks::TaskService`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::StatusId;

/// Lifecycle state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Assigned,
    Completed,
    Cancelled,
}

/// A work item tied to one instance at one status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub status_id: StatusId,
    pub name: String,
    pub description: Option<String>,
    pub state: TaskStatus,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: i32,
    pub comments: Option<String>,
}

impl Task {
    /// Open (created or assigned) past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, TaskStatus::Created | TaskStatus::Assigned)
            && self.due_date.is_some_and(|due| due < now)
    }

    /// Still awaiting completion.
    pub fn is_open(&self) -> bool {
        matches!(self.state, TaskStatus::Created | TaskStatus::Assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_due(due: Option<DateTime<Utc>>, state: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            status_id: StatusId::from("review"),
            name: "Process: Review".to_string(),
            description: None,
            state,
            assignee: None,
            created_at: Utc::now(),
            due_date: due,
            priority: 5,
            comments: None,
        }
    }

    #[test]
    fn overdue_requires_open_state_and_past_due() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(2));
        let future = Some(now + Duration::hours(2));

        assert!(task_due(past, TaskStatus::Created).is_overdue(now));
        assert!(task_due(past, TaskStatus::Assigned).is_overdue(now));
        assert!(!task_due(future, TaskStatus::Created).is_overdue(now));
        assert!(!task_due(past, TaskStatus::Completed).is_overdue(now));
        assert!(!task_due(None, TaskStatus::Created).is_overdue(now));
    }
}
