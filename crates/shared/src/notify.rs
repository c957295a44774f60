//! Notification dispatcher contract.
//!
//! Delivery is best-effort and out of scope for workflow correctness:
//! implementations must swallow their own failures.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Workflow lifecycle events published to the dispatcher.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A new approval step was created for an approver.
    StepCreated {
        /// The expense the step belongs to.
        expense_id: Uuid,
        /// The step identifier.
        step_id: Uuid,
        /// The approver who owns the step.
        approver_id: Uuid,
        /// The step's position in the workflow.
        sequence_index: i32,
    },
    /// The expense settled as approved.
    Approved {
        /// The settled expense.
        expense_id: Uuid,
    },
    /// The expense settled as rejected.
    Rejected {
        /// The settled expense.
        expense_id: Uuid,
    },
}

/// Best-effort event dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes one event. Must not propagate failures.
    async fn publish(&self, event: WorkflowEvent);
}

/// Dispatcher that emits events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn publish(&self, event: WorkflowEvent) {
        info!(?event, "workflow event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = WorkflowEvent::Approved {
            expense_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "approved");

        let event = WorkflowEvent::StepCreated {
            expense_id: Uuid::nil(),
            step_id: Uuid::nil(),
            approver_id: Uuid::nil(),
            sequence_index: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "step_created");
        assert_eq!(json["sequence_index"], 2);
    }

    #[tokio::test]
    async fn test_tracing_notifier_publishes() {
        // Must not panic or block.
        TracingNotifier
            .publish(WorkflowEvent::Rejected {
                expense_id: Uuid::nil(),
            })
            .await;
    }
}
