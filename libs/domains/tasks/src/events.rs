//! Task domain events.
//!
//! Every state change produces one event. Events travel inside an
//! [`EventEnvelope`] keyed by `task-{id}`, so a broker that partitions by key
//! keeps the events of one task in order.
//!
//! Event type       | Subject                    | Published by
//! -----------------|----------------------------|-----------------------------
//! `task.created`   | `<prefix>.task.created`    | create
//! `task.updated`   | `<prefix>.task.updated`    | update, assign, cancel
//! `task.completed` | `<prefix>.task.completed`  | complete
//! `task.deleted`   | `<prefix>.task.deleted`    | delete

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use messaging::{EventEnvelope, EventPublisher, MessagingConfig, PublishError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString, IntoStaticStr};

use crate::models::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum TaskEventType {
    #[strum(serialize = "task.created")]
    Created,
    #[strum(serialize = "task.updated")]
    Updated,
    #[strum(serialize = "task.completed")]
    Completed,
    #[strum(serialize = "task.deleted")]
    Deleted,
}

impl TaskEventType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCreatedEvent {
    pub task_id: i64,
    pub name: String,
    pub description: String,
    pub priority: TaskPriority,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskCreatedEvent {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            priority: task.priority,
            created_by: task.created_by,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdatedEvent {
    pub task_id: i64,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskUpdatedEvent {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletedEvent {
    pub task_id: i64,
    pub completed_at: DateTime<Utc>,
}

impl From<&Task> for TaskCompletedEvent {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            completed_at: task.completed_at.unwrap_or(task.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDeletedEvent {
    pub task_id: i64,
    pub deleted_at: DateTime<Utc>,
}

impl TaskDeletedEvent {
    pub fn now(task_id: i64) -> Self {
        Self {
            task_id,
            deleted_at: Utc::now(),
        }
    }
}

/// Announces task changes to the outside world.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskEventPublisher: Send + Sync {
    async fn publish_task_created(&self, event: &TaskCreatedEvent) -> Result<(), PublishError>;

    async fn publish_task_updated(&self, event: &TaskUpdatedEvent) -> Result<(), PublishError>;

    async fn publish_task_completed(&self, event: &TaskCompletedEvent)
    -> Result<(), PublishError>;

    async fn publish_task_deleted(&self, event: &TaskDeletedEvent) -> Result<(), PublishError>;
}

/// Drops every event. Used when no broker is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTaskEventPublisher;

#[async_trait]
impl TaskEventPublisher for NoopTaskEventPublisher {
    async fn publish_task_created(&self, event: &TaskCreatedEvent) -> Result<(), PublishError> {
        tracing::debug!(task_id = event.task_id, "Event publishing disabled, dropping task.created");
        Ok(())
    }

    async fn publish_task_updated(&self, event: &TaskUpdatedEvent) -> Result<(), PublishError> {
        tracing::debug!(task_id = event.task_id, "Event publishing disabled, dropping task.updated");
        Ok(())
    }

    async fn publish_task_completed(
        &self,
        event: &TaskCompletedEvent,
    ) -> Result<(), PublishError> {
        tracing::debug!(task_id = event.task_id, "Event publishing disabled, dropping task.completed");
        Ok(())
    }

    async fn publish_task_deleted(&self, event: &TaskDeletedEvent) -> Result<(), PublishError> {
        tracing::debug!(task_id = event.task_id, "Event publishing disabled, dropping task.deleted");
        Ok(())
    }
}

/// Wraps task events in an [`EventEnvelope`] and hands them to a broker.
pub struct BrokerTaskEventPublisher {
    publisher: Arc<dyn EventPublisher>,
    config: MessagingConfig,
}

impl BrokerTaskEventPublisher {
    pub fn new(publisher: Arc<dyn EventPublisher>, config: MessagingConfig) -> Self {
        Self { publisher, config }
    }

    async fn send<T: Serialize + Sync>(
        &self,
        event_type: TaskEventType,
        task_id: i64,
        payload: &T,
    ) -> Result<(), PublishError> {
        let bytes = EventEnvelope::new(event_type.as_str(), payload).to_bytes()?;
        let subject = self.config.subject_for(event_type.as_str());
        let key = format!("task-{task_id}");

        self.publisher.publish(&subject, &key, &bytes).await?;

        tracing::debug!(task_id, subject = %subject, "Published task event");
        Ok(())
    }
}

#[async_trait]
impl TaskEventPublisher for BrokerTaskEventPublisher {
    async fn publish_task_created(&self, event: &TaskCreatedEvent) -> Result<(), PublishError> {
        self.send(TaskEventType::Created, event.task_id, event).await
    }

    async fn publish_task_updated(&self, event: &TaskUpdatedEvent) -> Result<(), PublishError> {
        self.send(TaskEventType::Updated, event.task_id, event).await
    }

    async fn publish_task_completed(
        &self,
        event: &TaskCompletedEvent,
    ) -> Result<(), PublishError> {
        self.send(TaskEventType::Completed, event.task_id, event).await
    }

    async fn publish_task_deleted(&self, event: &TaskDeletedEvent) -> Result<(), PublishError> {
        self.send(TaskEventType::Deleted, event.task_id, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateTask;
    use messaging::MemoryPublisher;

    fn task() -> Task {
        let mut task = Task::new(CreateTask {
            name: "Ship release".to_string(),
            description: "tag and publish".to_string(),
            priority: TaskPriority::High,
            created_by: 3,
        });
        task.id = 42;
        task
    }

    fn broker(memory: &Arc<MemoryPublisher>) -> BrokerTaskEventPublisher {
        BrokerTaskEventPublisher::new(memory.clone(), MessagingConfig::default())
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(TaskEventType::Created.as_str(), "task.created");
        assert_eq!(TaskEventType::Completed.to_string(), "task.completed");
    }

    #[tokio::test]
    async fn test_created_event_envelope() {
        let memory = Arc::new(MemoryPublisher::new());
        let task = task();

        broker(&memory)
            .publish_task_created(&TaskCreatedEvent::from(&task))
            .await
            .unwrap();

        let messages = memory.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "tasks.task.created");
        assert_eq!(messages[0].key, "task-42");

        let body = messages[0].json().unwrap();
        assert_eq!(body["event_type"], "task.created");
        assert_eq!(body["payload"]["task_id"], 42);
        assert_eq!(body["payload"]["name"], "Ship release");
        assert_eq!(body["payload"]["priority"], "high");
        assert_eq!(body["payload"]["created_by"], 3);
    }

    #[tokio::test]
    async fn test_updated_event_omits_missing_assignee() {
        let memory = Arc::new(MemoryPublisher::new());

        broker(&memory)
            .publish_task_updated(&TaskUpdatedEvent::from(&task()))
            .await
            .unwrap();

        let body = memory.messages().await[0].json().unwrap();
        assert_eq!(body["payload"]["status"], "pending");
        assert!(body["payload"].get("assigned_to").is_none());
    }

    #[tokio::test]
    async fn test_broker_failure_is_returned() {
        let memory = Arc::new(MemoryPublisher::failing());

        let err = broker(&memory)
            .publish_task_deleted(&TaskDeletedEvent::now(42))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Transport(_)));
    }
}
