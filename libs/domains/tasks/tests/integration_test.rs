//! Postgres-backed tests for the Tasks domain
//!
//! Each test starts its own container; run with
//! `cargo test -p domain_tasks -- --ignored`.

use database::postgres::PgTransactionManager;
use domain_tasks::*;
use messaging::{MemoryPublisher, MessagingConfig};
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase};

type PgService = TaskService<PgTaskRepository, PgTransactionManager>;

fn service(db: &TestDatabase, broker: Arc<MemoryPublisher>) -> PgService {
    TaskService::new(
        PgTaskRepository::new(db.connection()),
        PgTransactionManager::new(db.connection()),
        Arc::new(BrokerTaskEventPublisher::new(
            broker,
            MessagingConfig::default(),
        )),
    )
}

fn input(builder: &TestDataBuilder, suffix: &str) -> CreateTask {
    CreateTask {
        name: builder.name("task", suffix),
        description: "integration".to_string(),
        priority: TaskPriority::Medium,
        created_by: builder.user_id(),
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_create_get_round_trip() {
    let db = TestDatabase::new().await;
    let service = service(&db, Arc::new(MemoryPublisher::new()));
    let builder = TestDataBuilder::from_test_name("pg_create_get");

    let created = service.create_task(input(&builder, "main")).await.unwrap();
    assert!(created.id > 0);

    let fetched = service.get_task(created.id).await.unwrap();
    assert_eq!(fetched.name, created.name);
    assert_eq!(fetched.status, TaskStatus::Pending);
    assert_eq!(fetched.created_by, builder.user_id());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_state_machine_against_postgres() {
    let db = TestDatabase::new().await;
    let broker = Arc::new(MemoryPublisher::new());
    let service = service(&db, broker.clone());
    let builder = TestDataBuilder::from_test_name("pg_state_machine");

    let task = service.create_task(input(&builder, "flow")).await.unwrap();

    let assigned = service.assign_task(task.id, 9).await.unwrap();
    assert_eq!(assigned.status, TaskStatus::InProgress);

    let completed = service.complete_task(task.id).await.unwrap();
    assert!(completed.completed_at.is_some());

    let stored = service.get_task(task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.assigned_to, Some(9));

    assert!(matches!(
        service.cancel_task(task.id).await,
        Err(TaskError::InvalidState(_))
    ));
    assert_eq!(broker.messages().await.len(), 3);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_list_newest_first_with_filters() {
    let db = TestDatabase::new().await;
    let service = service(&db, Arc::new(MemoryPublisher::new()));
    let builder = TestDataBuilder::from_test_name("pg_list");

    let mut ids = Vec::new();
    for i in 0..5 {
        let task = service
            .create_task(input(&builder, &i.to_string()))
            .await
            .unwrap();
        ids.push(task.id);
    }
    service.assign_task(ids[0], 4).await.unwrap();

    let page = service
        .list_tasks(TaskFilter {
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    let page_ids: Vec<_> = page.iter().map(|t| t.id).collect();
    assert_eq!(page_ids, [ids[4], ids[3]]);

    let assigned = service
        .list_tasks(TaskFilter {
            assigned_to: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, ids[0]);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_delete_is_not_repeatable() {
    let db = TestDatabase::new().await;
    let service = service(&db, Arc::new(MemoryPublisher::new()));
    let builder = TestDataBuilder::from_test_name("pg_delete");

    let task = service.create_task(input(&builder, "gone")).await.unwrap();

    service.delete_task(task.id).await.unwrap();
    assert_eq!(
        service.delete_task(task.id).await,
        Err(TaskError::NotFound(task.id))
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_failed_rule_leaves_row_untouched() {
    let db = TestDatabase::new().await;
    let service = service(&db, Arc::new(MemoryPublisher::new()));
    let builder = TestDataBuilder::from_test_name("pg_rollback");

    let task = service.create_task(input(&builder, "keep")).await.unwrap();

    let err = service
        .update_task(
            task.id,
            UpdateTask {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));

    let stored = service.get_task(task.id).await.unwrap();
    assert_eq!(stored.name, task.name);
}
