use database::postgres::{NoopTransactionManager, TransactionManager};
use messaging::PublishError;
use observability::TaskMetrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};
use validator::Validate;

use crate::error::{TaskError, TaskResult};
use crate::events::{
    TaskCompletedEvent, TaskCreatedEvent, TaskDeletedEvent, TaskEventPublisher, TaskEventType,
    TaskUpdatedEvent,
};
use crate::models::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::repository::TaskRepository;

/// Service layer for Task business logic
///
/// Each mutation runs as one unit of work: load, apply the domain rule,
/// persist, then publish the matching event. Publishing is best effort: a
/// broker failure is logged and counted, never returned.
pub struct TaskService<R: TaskRepository, X: TransactionManager = NoopTransactionManager> {
    repository: Arc<R>,
    transactions: Arc<X>,
    publisher: Arc<dyn TaskEventPublisher>,
}

impl<R: TaskRepository, X: TransactionManager> Clone for TaskService<R, X> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            transactions: Arc::clone(&self.transactions),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<R: TaskRepository, X: TransactionManager> TaskService<R, X> {
    pub fn new(repository: R, transactions: X, publisher: Arc<dyn TaskEventPublisher>) -> Self {
        Self {
            repository: Arc::new(repository),
            transactions: Arc::new(transactions),
            publisher,
        }
    }

    /// Create a new pending task
    #[instrument(skip(self, input), fields(created_by = input.created_by))]
    pub async fn create_task(&self, input: CreateTask) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.create(input).await;

        if let Ok(task) = &result {
            TaskMetrics::record_created(&task.priority.to_string());
        }
        observe("create", started, &result);
        result
    }

    /// Get a task by ID
    #[instrument(skip(self))]
    pub async fn get_task(&self, id: i64) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.load(id).await;
        observe("get", started, &result);
        result
    }

    /// List tasks newest first. The limit is normalized before querying.
    #[instrument(skip(self))]
    pub async fn list_tasks(&self, filter: TaskFilter) -> TaskResult<Vec<Task>> {
        let started = Instant::now();
        let result = self.repository.list(&filter.normalized()).await;
        observe("list", started, &result);
        result
    }

    /// Merge the present fields of `input` into a task
    #[instrument(skip(self, input))]
    pub async fn update_task(&self, id: i64, input: UpdateTask) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.update(id, input).await;
        observe("update", started, &result);
        result
    }

    /// Assign a task to a user
    #[instrument(skip(self))]
    pub async fn assign_task(&self, id: i64, user_id: i64) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.assign(id, user_id).await;
        observe("assign", started, &result);
        result
    }

    /// Mark a task as completed
    #[instrument(skip(self))]
    pub async fn complete_task(&self, id: i64) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.complete(id).await;

        if result.is_ok() {
            TaskMetrics::record_completed();
        }
        observe("complete", started, &result);
        result
    }

    /// Cancel a task that is not yet finished
    #[instrument(skip(self))]
    pub async fn cancel_task(&self, id: i64) -> TaskResult<Task> {
        let started = Instant::now();
        let result = self.cancel(id).await;
        observe("cancel", started, &result);
        result
    }

    /// Delete a task
    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: i64) -> TaskResult<()> {
        let started = Instant::now();
        let result = self.delete(id).await;
        observe("delete", started, &result);
        result
    }

    async fn load(&self, id: i64) -> TaskResult<Task> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(TaskError::NotFound(id))
    }

    async fn create(&self, input: CreateTask) -> TaskResult<Task> {
        input.validate()?;

        let mut task = Task::new(input);
        task.validate()?;

        self.transactions
            .within_transaction(Box::pin(async move {
                self.repository.create(&mut task).await?;

                let event = TaskCreatedEvent::from(&task);
                self.publish(
                    TaskEventType::Created,
                    task.id,
                    self.publisher.publish_task_created(&event),
                )
                .await;

                Ok::<_, TaskError>(task)
            }))
            .await
    }

    async fn update(&self, id: i64, input: UpdateTask) -> TaskResult<Task> {
        self.transactions
            .within_transaction(Box::pin(async move {
                let mut task = self.load(id).await?;
                let was_completed = task.status == TaskStatus::Completed;

                task.apply_update(input)?;
                task.validate()?;
                self.repository.update(&task).await?;

                let event = TaskUpdatedEvent::from(&task);
                self.publish(
                    TaskEventType::Updated,
                    task.id,
                    self.publisher.publish_task_updated(&event),
                )
                .await;

                if !was_completed && task.status == TaskStatus::Completed {
                    TaskMetrics::record_completed();
                }

                Ok::<_, TaskError>(task)
            }))
            .await
    }

    async fn assign(&self, id: i64, user_id: i64) -> TaskResult<Task> {
        self.transactions
            .within_transaction(Box::pin(async move {
                let mut task = self.load(id).await?;

                task.assign(user_id)?;
                self.repository.update(&task).await?;

                let event = TaskUpdatedEvent::from(&task);
                self.publish(
                    TaskEventType::Updated,
                    task.id,
                    self.publisher.publish_task_updated(&event),
                )
                .await;

                Ok::<_, TaskError>(task)
            }))
            .await
    }

    async fn complete(&self, id: i64) -> TaskResult<Task> {
        self.transactions
            .within_transaction(Box::pin(async move {
                let mut task = self.load(id).await?;

                task.complete()?;
                self.repository.update(&task).await?;

                let event = TaskCompletedEvent::from(&task);
                self.publish(
                    TaskEventType::Completed,
                    task.id,
                    self.publisher.publish_task_completed(&event),
                )
                .await;

                Ok::<_, TaskError>(task)
            }))
            .await
    }

    async fn cancel(&self, id: i64) -> TaskResult<Task> {
        self.transactions
            .within_transaction(Box::pin(async move {
                let mut task = self.load(id).await?;

                task.cancel()?;
                self.repository.update(&task).await?;

                let event = TaskUpdatedEvent::from(&task);
                self.publish(
                    TaskEventType::Updated,
                    task.id,
                    self.publisher.publish_task_updated(&event),
                )
                .await;

                Ok::<_, TaskError>(task)
            }))
            .await
    }

    async fn delete(&self, id: i64) -> TaskResult<()> {
        self.transactions
            .within_transaction(Box::pin(async move {
                self.repository.delete(id).await?;

                let event = TaskDeletedEvent::now(id);
                self.publish(
                    TaskEventType::Deleted,
                    id,
                    self.publisher.publish_task_deleted(&event),
                )
                .await;

                Ok::<_, TaskError>(())
            }))
            .await
    }

    /// Awaits a publish and swallows its failure.
    async fn publish<F>(&self, event_type: TaskEventType, task_id: i64, publish: F)
    where
        F: Future<Output = Result<(), PublishError>>,
    {
        match publish.await {
            Ok(()) => debug!(task_id, event_type = event_type.as_str(), "Task event published"),
            Err(err) => {
                warn!(
                    task_id,
                    event_type = event_type.as_str(),
                    error = %err,
                    "Failed to publish task event"
                );
                TaskMetrics::record_publish_failure(event_type.as_str());
            }
        }
    }
}

/// Records duration and, on failure, the error kind of one operation.
fn observe<T>(operation: &'static str, started: Instant, result: &TaskResult<T>) {
    TaskMetrics::record_duration(operation, started.elapsed());

    if let Err(err) = result {
        TaskMetrics::record_failed(operation, err.kind());
        match err {
            TaskError::NotFound(_) => debug!(operation, error = %err, "Task not found"),
            _ => error!(operation, kind = err.kind(), error = %err, "Task operation failed"),
        }
    }
}
