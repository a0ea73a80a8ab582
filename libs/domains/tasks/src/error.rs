use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("task with id {0} not found")]
    NotFound(i64),

    /// Input that breaks a field rule (name, created_by)
    #[error("{0}")]
    Validation(String),

    /// A well-formed request the operation cannot use
    #[error("{0}")]
    InvalidInput(String),

    /// The task's status does not allow the operation
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::NotFound(_) => "not_found",
            TaskError::Validation(_) => "validation",
            TaskError::InvalidInput(_) => "invalid_input",
            TaskError::InvalidState(_) => "invalid_state",
            TaskError::Unauthorized(_) => "unauthorized",
            TaskError::Internal(_) => "internal",
            TaskError::Database(_) => "database",
        }
    }
}

/// Convert TaskError to AppError for standardized error responses
impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(_) => AppError::NotFound(err.to_string()),
            TaskError::Validation(msg) => AppError::Validation(msg),
            TaskError::InvalidInput(msg) => AppError::BadRequest(msg),
            TaskError::InvalidState(msg) => AppError::Conflict(msg),
            TaskError::Unauthorized(msg) => AppError::Unauthorized(msg),
            TaskError::Internal(msg) => AppError::InternalServerError(msg),
            TaskError::Database(msg) => {
                AppError::InternalServerError(format!("Database error: {}", msg))
            }
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for TaskError {
    fn from(err: sea_orm::DbErr) -> Self {
        TaskError::Database(err.to_string())
    }
}

/// Keeps the first field message so clients see e.g. "task name cannot be
/// empty" rather than the validator's full report.
impl From<ValidationErrors> for TaskError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        TaskError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rstest::rstest;

    #[rstest]
    #[case(TaskError::NotFound(3), StatusCode::NOT_FOUND)]
    #[case(TaskError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(TaskError::InvalidInput("x".into()), StatusCode::BAD_REQUEST)]
    #[case(TaskError::InvalidState("x".into()), StatusCode::CONFLICT)]
    #[case(TaskError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[case(TaskError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(TaskError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] err: TaskError, #[case] status: StatusCode) {
        assert_eq!(AppError::from(err).status(), status);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(TaskError::NotFound(42).to_string(), "task with id 42 not found");
    }
}
