// Event bus for instance lifecycle signals

//! # Event System
//!
//! Fire-and-forget notifications about instance lifecycle changes. The
//! transition engine publishes after every committed state change; anything
//! interested (notification senders, audit sinks, dashboards) subscribes.
//! Publishing never blocks and never fails the operation that triggered it:
//! with no subscribers the event is simply dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Instance, StatusId, TransitionId, WorkflowId};

/// What happened, with the identifiers a subscriber needs to react.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WorkflowEventKind {
    InstanceStarted {
        business_key: String,
        initial_status: StatusId,
    },
    TransitionExecuted {
        transition: TransitionId,
        from: StatusId,
        to: StatusId,
        executed_by: String,
    },
    InstanceCompleted {
        final_status: StatusId,
    },
}

/// An instance lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEvent {
    pub id: Uuid,
    pub workflow_id: WorkflowId,
    pub instance_id: Uuid,
    pub kind: WorkflowEventKind,
    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    fn new(instance: &Instance, kind: WorkflowEventKind) -> Self {
        WorkflowEvent {
            id: Uuid::new_v4(),
            workflow_id: instance.workflow_id.clone(),
            instance_id: instance.id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus for workflow events.
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        // Lagging subscribers lose oldest events rather than blocking the engine
        let (sender, _) = broadcast::channel(1000);
        EventBus { sender }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Lossy by design: no subscribers, no delivery.
    pub fn publish(&self, event: WorkflowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn emit_instance_started(&self, instance: &Instance) {
        self.publish(WorkflowEvent::new(
            instance,
            WorkflowEventKind::InstanceStarted {
                business_key: instance.business_key.clone(),
                initial_status: instance.current_status.clone(),
            },
        ));
    }

    pub fn emit_transition_executed(
        &self,
        instance: &Instance,
        transition: &TransitionId,
        from: &StatusId,
        executed_by: &str,
    ) {
        self.publish(WorkflowEvent::new(
            instance,
            WorkflowEventKind::TransitionExecuted {
                transition: transition.clone(),
                from: from.clone(),
                to: instance.current_status.clone(),
                executed_by: executed_by.to_string(),
            },
        ));
    }

    pub fn emit_instance_completed(&self, instance: &Instance) {
        self.publish(WorkflowEvent::new(
            instance,
            WorkflowEventKind::InstanceCompleted {
                final_status: instance.current_status.clone(),
            },
        ));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        EventBus {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusId;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let instance = Instance::new("wf", "KEY-1", StatusId::from("start"), "tests");
        bus.emit_instance_started(&instance);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.instance_id, instance.id);
        assert!(matches!(
            event.kind,
            WorkflowEventKind::InstanceStarted { .. }
        ));
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let instance = Instance::new("wf", "KEY-1", StatusId::from("start"), "tests");
        // Must not panic or error
        bus.emit_instance_completed(&instance);
    }
}
