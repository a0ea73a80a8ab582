mod task_id;
mod tasks;

pub use task_id::TaskId;

use axum::{
    Router,
    routing::{get, post},
};
use axum_helpers::errors::responses::{
    BadRequestResponse, ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
};
use database::postgres::TransactionManager;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    AssignTask, CreateTask, MessageResponse, Task, TaskPriority, TaskStatus, UpdateTask,
};
use crate::repository::TaskRepository;
use crate::service::TaskService;

/// OpenAPI documentation for the Tasks API
#[derive(OpenApi)]
#[openapi(
    paths(
        tasks::list_tasks,
        tasks::get_task,
        tasks::create_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::assign_task,
        tasks::complete_task,
        tasks::cancel_task,
    ),
    components(
        schemas(
            Task,
            TaskStatus,
            TaskPriority,
            CreateTask,
            UpdateTask,
            AssignTask,
            MessageResponse
        ),
        responses(
            BadRequestResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "tasks", description = "Task lifecycle management")
    )
)]
pub struct TasksApiDoc;

/// Task routes, meant to be nested under `/tasks`.
///
/// | Method | Path             | Success |
/// |--------|------------------|---------|
/// | GET    | `/`              | 200     |
/// | POST   | `/`              | 201     |
/// | GET    | `/{id}`          | 200     |
/// | PUT    | `/{id}`          | 200     |
/// | DELETE | `/{id}`          | 204     |
/// | POST   | `/{id}/assign`   | 200     |
/// | POST   | `/{id}/complete` | 200     |
/// | POST   | `/{id}/cancel`   | 200     |
pub fn router<R, X>(service: TaskService<R, X>) -> Router
where
    R: TaskRepository + 'static,
    X: TransactionManager + 'static,
{
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/{id}/assign", post(tasks::assign_task))
        .route("/{id}/complete", post(tasks::complete_task))
        .route("/{id}/cancel", post(tasks::cancel_task))
        .with_state(Arc::new(service))
}
