use async_trait::async_trait;
use database::postgres::current_transaction;
use observability::DatabaseMetrics;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::time::Instant;

use crate::{
    entity,
    error::{TaskError, TaskResult},
    models::{Task, TaskFilter},
    repository::TaskRepository,
};

/// Runs `$body` with `$conn` bound to the ambient transaction when there is
/// one, or to the pool otherwise, and records it under `$operation` in
/// `db_queries_total`/`db_query_duration_seconds`.
macro_rules! with_connection {
    ($self:ident, $operation:literal, |$conn:ident| $body:expr) => {{
        let started = Instant::now();
        let result = match current_transaction() {
            Some(txn) => {
                let $conn = txn.as_ref();
                $body
            }
            None => {
                let $conn = &$self.db;
                $body
            }
        };
        DatabaseMetrics::record_query($operation, started.elapsed(), result.is_ok());
        result
    }};
}

pub struct PgTaskRepository {
    db: DatabaseConnection,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_error(operation: &'static str) -> impl FnOnce(DbErr) -> TaskError {
    move |err| TaskError::Database(format!("failed to {operation}: {err}"))
}

async fn insert<C: ConnectionTrait>(conn: &C, task: &Task) -> Result<entity::Model, DbErr> {
    entity::ActiveModel::for_insert(task).insert(conn).await
}

async fn find<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<entity::Model>, DbErr> {
    entity::Entity::find_by_id(id).one(conn).await
}

async fn select<C: ConnectionTrait>(
    conn: &C,
    filter: &TaskFilter,
) -> Result<Vec<entity::Model>, DbErr> {
    let mut query = entity::Entity::find();

    if let Some(status) = filter.status {
        query = query.filter(entity::Column::Status.eq(status));
    }

    if let Some(priority) = filter.priority {
        query = query.filter(entity::Column::Priority.eq(priority));
    }

    if let Some(assigned_to) = filter.assigned_to {
        query = query.filter(entity::Column::AssignedTo.eq(assigned_to));
    }

    query
        .order_by_desc(entity::Column::CreatedAt)
        .order_by_desc(entity::Column::Id)
        .limit(filter.limit)
        .offset(filter.offset)
        .all(conn)
        .await
}

async fn overwrite<C: ConnectionTrait>(conn: &C, task: &Task) -> Result<u64, DbErr> {
    let result = entity::Entity::update_many()
        .set(entity::ActiveModel::for_update(task))
        .filter(entity::Column::Id.eq(task.id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

async fn remove<C: ConnectionTrait>(conn: &C, id: i64) -> Result<u64, DbErr> {
    let result = entity::Entity::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected)
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: &mut Task) -> TaskResult<()> {
        let model = with_connection!(self, "insert", |conn| insert(conn, task).await)
            .map_err(db_error("insert task"))?;

        *task = model.into();
        tracing::info!(task_id = task.id, "Created task");
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>> {
        let model = with_connection!(self, "select_one", |conn| find(conn, id).await)
            .map_err(db_error("load task"))?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: &TaskFilter) -> TaskResult<Vec<Task>> {
        let models = with_connection!(self, "select", |conn| select(conn, filter).await)
            .map_err(db_error("list tasks"))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, task: &Task) -> TaskResult<()> {
        let rows = with_connection!(self, "update", |conn| overwrite(conn, task).await)
            .map_err(db_error("update task"))?;

        if rows == 0 {
            return Err(TaskError::NotFound(task.id));
        }

        tracing::info!(task_id = task.id, status = %task.status, "Updated task");
        Ok(())
    }

    async fn delete(&self, id: i64) -> TaskResult<()> {
        let rows = with_connection!(self, "delete", |conn| remove(conn, id).await)
            .map_err(db_error("delete task"))?;

        if rows == 0 {
            return Err(TaskError::NotFound(id));
        }

        tracing::info!(task_id = id, "Deleted task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopTaskEventPublisher;
    use crate::models::{CreateTask, TaskPriority, TaskStatus};
    use crate::service::TaskService;
    use chrono::{TimeZone, Utc};
    use database::postgres::PgTransactionManager;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn model(id: i64, status: TaskStatus) -> entity::Model {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        entity::Model {
            id,
            name: format!("task {id}"),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            created_by: 1,
            assigned_to: None,
            created_at: at.into(),
            updated_at: at.into(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_hydrates_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(11, TaskStatus::Pending)]])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        let mut task: Task = model(0, TaskStatus::Pending).into();
        repo.create(&mut task).await.unwrap();

        assert_eq!(task.id, 11);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        assert_eq!(repo.get_by_id(5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_without_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        let task: Task = model(8, TaskStatus::InProgress).into();
        assert_eq!(repo.update(&task).await, Err(TaskError::NotFound(8)));
    }

    #[tokio::test]
    async fn test_delete_existing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        assert_eq!(repo.delete(3).await, Ok(()));
    }

    #[tokio::test]
    async fn test_errors_carry_operation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection lost".to_string())])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        match repo.list(&TaskFilter::default()).await {
            Err(TaskError::Database(message)) => {
                assert!(message.starts_with("failed to list tasks"));
                assert!(message.contains("connection lost"));
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_statements_are_timed() {
        let handle = observability::init_metrics().unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_errors([DbErr::Custom("connection lost".to_string())])
            .into_connection();
        let repo = PgTaskRepository::new(db);

        repo.delete(3).await.unwrap();
        assert!(repo.get_by_id(3).await.is_err());

        let rendered = observability::render_metrics(Some(handle));
        assert!(rendered.contains(r#"db_queries_total{operation="delete",status="ok"}"#));
        assert!(rendered.contains(r#"db_queries_total{operation="select_one",status="error"}"#));
        assert!(rendered.contains("db_query_duration_seconds"));
    }

    #[tokio::test]
    async fn test_create_task_runs_insert_inside_one_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(21, TaskStatus::Pending)]])
            .into_connection();
        let service = TaskService::new(
            PgTaskRepository::new(db.clone()),
            PgTransactionManager::new(db.clone()),
            Arc::new(NoopTaskEventPublisher),
        );

        let task = service
            .create_task(CreateTask {
                name: "Write runbook".to_string(),
                description: String::new(),
                priority: TaskPriority::Low,
                created_by: 4,
            })
            .await
            .unwrap();
        assert_eq!(task.id, 21);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql: Vec<&str> = log[0]
            .statements()
            .iter()
            .map(|statement| statement.sql.as_str())
            .collect();
        assert_eq!(sql.len(), 3);
        assert_eq!(sql[0], "BEGIN");
        assert!(sql[1].starts_with(r#"INSERT INTO "tasks""#));
        assert!(sql[1].contains("RETURNING"));
        assert_eq!(sql[2], "COMMIT");
    }
}
