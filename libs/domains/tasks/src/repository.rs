use async_trait::async_trait;

use crate::error::TaskResult;
use crate::models::{Task, TaskFilter};

/// Repository trait for Task persistence
///
/// Implementations run on the ambient transaction when the caller is inside
/// [`TransactionManager::within_transaction`](database::postgres::TransactionManager::within_transaction).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task, filling in its store-assigned id
    async fn create(&self, task: &mut Task) -> TaskResult<()>;

    /// Get a task by ID
    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>>;

    /// List tasks newest first
    async fn list(&self, filter: &TaskFilter) -> TaskResult<Vec<Task>>;

    /// Overwrite a stored task. `NotFound` when no row has its id.
    async fn update(&self, task: &Task) -> TaskResult<()>;

    /// Delete a task by ID. `NotFound` when no row has the id.
    async fn delete(&self, id: i64) -> TaskResult<()>;
}
