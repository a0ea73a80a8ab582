use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use axum_helpers::AppError;

/// The `{id}` path segment of a task route.
///
/// Anything that is not an integer is rejected with `400 invalid task id`
/// before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub i64);

impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let invalid = || AppError::BadRequest("invalid task id".to_string());

        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid())?;

        raw.trim().parse().map(TaskId).map_err(|_| invalid())
    }
}
