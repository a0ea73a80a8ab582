//! Task events coming back from the broker.

use async_trait::async_trait;
use messaging::{ConsumeError, EventHandler, ReceivedEvent};
use tracing::info;

use crate::events::{
    TaskCompletedEvent, TaskCreatedEvent, TaskDeletedEvent, TaskEventType, TaskUpdatedEvent,
};

/// Logs each task event it receives, one line per event type, tagged with the
/// publishing request's `trace_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskEventLogger;

#[async_trait]
impl EventHandler for TaskEventLogger {
    async fn handle(&self, event: &ReceivedEvent) -> Result<(), ConsumeError> {
        let event_type: TaskEventType = event
            .event_type()
            .parse()
            .map_err(|_| ConsumeError::UnknownEventType(event.event_type().to_string()))?;
        let trace_id = event.headers.trace_id.as_deref().unwrap_or_default();

        match event_type {
            TaskEventType::Created => {
                let created: TaskCreatedEvent = event.payload_as()?;
                info!(
                    task_id = created.task_id,
                    name = %created.name,
                    priority = %created.priority,
                    created_by = created.created_by,
                    trace_id,
                    "Task created"
                );
            }
            TaskEventType::Updated => {
                let updated: TaskUpdatedEvent = event.payload_as()?;
                info!(
                    task_id = updated.task_id,
                    status = %updated.status,
                    assigned_to = ?updated.assigned_to,
                    trace_id,
                    "Task updated"
                );
            }
            TaskEventType::Completed => {
                let completed: TaskCompletedEvent = event.payload_as()?;
                info!(
                    task_id = completed.task_id,
                    completed_at = %completed.completed_at,
                    trace_id,
                    "Task completed"
                );
            }
            TaskEventType::Deleted => {
                let deleted: TaskDeletedEvent = event.payload_as()?;
                info!(task_id = deleted.task_id, trace_id, "Task deleted");
            }
        }

        Ok(())
    }
}
