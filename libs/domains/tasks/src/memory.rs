use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskFilter};
use crate::repository::TaskRepository;

/// [`TaskRepository`] kept in process memory.
///
/// Used by tests and local runs without Postgres. Pair it with
/// `NoopTransactionManager`; nothing here is rolled back.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<i64, Task>>,
    last_id: AtomicI64,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &mut Task) -> TaskResult<()> {
        task.id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.tasks.write().await.insert(task.id, task.clone());

        tracing::debug!(task_id = task.id, "Created task in memory");
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskResult<Vec<Task>> {
        let tasks = self.tasks.read().await;

        let mut matching: Vec<&Task> = tasks
            .values()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.assigned_to.is_none_or(|a| t.assigned_to == Some(a)))
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, task: &Task) -> TaskResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(TaskError::NotFound(task.id)),
        }
    }

    async fn delete(&self, id: i64) -> TaskResult<()> {
        self.tasks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTask, TaskPriority, TaskStatus};
    use chrono::Duration;

    fn new_task(name: &str, priority: TaskPriority) -> Task {
        Task::new(CreateTask {
            name: name.to_string(),
            description: String::new(),
            priority,
            created_by: 1,
        })
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryTaskRepository::new();
        let mut first = new_task("a", TaskPriority::Low);
        let mut second = new_task("b", TaskPriority::Low);

        repo.create(&mut first).await.unwrap();
        repo.create(&mut second).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(repo.get_by_id(2).await.unwrap(), Some(second));
        assert_eq!(repo.get_by_id(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_filters_orders_and_pages() {
        let repo = InMemoryTaskRepository::new();
        let base = chrono::Utc::now();

        for i in 0..5 {
            let priority = if i % 2 == 0 {
                TaskPriority::High
            } else {
                TaskPriority::Low
            };
            let mut task = new_task(&format!("t{}", i + 1), priority);
            task.created_at = base + Duration::seconds(i);
            repo.create(&mut task).await.unwrap();
        }

        let page = repo
            .list(&TaskFilter {
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = page.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["t5", "t4"]);

        let high = repo
            .list(&TaskFilter {
                priority: Some(TaskPriority::High),
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = high.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["t3", "t1"]);

        let none = repo
            .list(&TaskFilter {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = InMemoryTaskRepository::new();
        let mut task = new_task("a", TaskPriority::Medium);
        task.id = 99;

        assert_eq!(repo.update(&task).await, Err(TaskError::NotFound(99)));
        assert_eq!(repo.delete(99).await, Err(TaskError::NotFound(99)));
    }

    #[tokio::test]
    async fn test_delete_removes() {
        let repo = InMemoryTaskRepository::new();
        let mut task = new_task("a", TaskPriority::Medium);
        repo.create(&mut task).await.unwrap();

        repo.delete(task.id).await.unwrap();
        assert!(repo.is_empty().await);
    }
}
