use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_helpers::errors::responses::{
    BadRequestResponse, ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
};
use axum_helpers::{ErrorResponse, JsonBody};
use database::postgres::TransactionManager;
use std::sync::Arc;

use super::TaskId;
use crate::error::{TaskError, TaskResult};
use crate::models::{
    AssignTask, CreateTask, ListTasksQuery, MessageResponse, Task, UpdateTask,
};
use crate::repository::TaskRepository;
use crate::service::TaskService;

type Service<R, X> = State<Arc<TaskService<R, X>>>;

/// List tasks, newest first
#[utoipa::path(
    get,
    path = "",
    tag = "tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "List of tasks", body = Vec<Task>),
        (status = 400, description = "Unknown status or priority", body = ErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn list_tasks<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    Query(query): Query<ListTasksQuery>,
) -> TaskResult<Json<Vec<Task>>> {
    let filter = query.normalize()?;
    let tasks = service.list_tasks(filter).await?;
    Ok(Json(tasks))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 400, description = "Invalid task ID", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn get_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
) -> TaskResult<impl IntoResponse> {
    let task = service.get_task(id).await?;
    Ok(Json(task))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "",
    tag = "tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created successfully", body = Task),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn create_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    JsonBody(input): JsonBody<CreateTask>,
) -> TaskResult<impl IntoResponse> {
    let task = service.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated successfully", body = Task),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, description = "Status change not allowed", body = ErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn update_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
    JsonBody(input): JsonBody<UpdateTask>,
) -> TaskResult<impl IntoResponse> {
    let task = service.update_task(id, input).await?;
    Ok(Json(task))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted successfully"),
        (status = 400, description = "Invalid task ID", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn delete_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
) -> TaskResult<impl IntoResponse> {
    service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a task to a user
#[utoipa::path(
    post,
    path = "/{id}/assign",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = AssignTask,
    responses(
        (status = 200, description = "Task assigned", body = MessageResponse),
        (status = 400, description = "Missing user_id or invalid request", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, description = "Task is completed or cancelled", body = ErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn assign_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
    JsonBody(body): JsonBody<AssignTask>,
) -> TaskResult<impl IntoResponse> {
    if body.user_id <= 0 {
        return Err(TaskError::InvalidInput("user_id is required".to_string()));
    }

    service.assign_task(id, body.user_id).await?;
    Ok(Json(MessageResponse::new("task assigned successfully")))
}

/// Mark a task as completed
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task completed", body = MessageResponse),
        (status = 400, description = "Invalid task ID", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn complete_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
) -> TaskResult<impl IntoResponse> {
    service.complete_task(id).await?;
    Ok(Json(MessageResponse::new("task completed successfully")))
}

/// Cancel a task
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task cancelled", body = MessageResponse),
        (status = 400, description = "Invalid task ID", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub async fn cancel_task<R: TaskRepository, X: TransactionManager>(
    State(service): Service<R, X>,
    TaskId(id): TaskId,
) -> TaskResult<impl IntoResponse> {
    service.cancel_task(id).await?;
    Ok(Json(MessageResponse::new("task cancelled successfully")))
}
