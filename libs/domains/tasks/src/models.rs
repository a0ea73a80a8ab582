use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::{TaskError, TaskResult};

pub const MAX_NAME_LENGTH: usize = 255;
pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

/// Task priority levels
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_priority")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    #[sea_orm(string_value = "low")]
    Low,
    /// Default priority
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

/// Task status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Created, nobody working on it yet
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Assigned and being worked on
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl TaskStatus {
    /// Completed and cancelled tasks never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Whether `next` is reachable from `self` in one step. Staying put is
    /// always allowed.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;

        self == next
            || matches!(
                (self, next),
                (Pending, InProgress | Completed | Cancelled) | (InProgress, Completed | Cancelled)
            )
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Store-assigned identifier, `0` until persisted
    pub id: i64,
    /// Task name (1-255 characters)
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// User who created the task
    pub created_by: i64,
    /// User the task is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the task reaches `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A pending, unsaved task built from creation input.
    pub fn new(input: CreateTask) -> Self {
        let now = now();
        Self {
            id: 0,
            name: input.name,
            description: input.description,
            status: TaskStatus::Pending,
            priority: input.priority,
            created_by: input.created_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Checks the field rules a stored task must satisfy.
    pub fn validate(&self) -> TaskResult<()> {
        check_name(&self.name).map_err(TaskError::Validation)?;

        if self.created_by <= 0 {
            return Err(TaskError::Validation(
                "created_by must be a positive user id".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending and in-progress tasks can be (re)assigned.
    pub fn can_be_assigned(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
    }

    /// Assigns the task to `user_id`, moving a pending task to in-progress.
    pub fn assign(&mut self, user_id: i64) -> TaskResult<()> {
        if !self.can_be_assigned() {
            return Err(TaskError::InvalidState(format!(
                "task cannot be assigned in its current status: {}",
                self.status
            )));
        }
        if user_id <= 0 {
            return Err(TaskError::InvalidInput(
                "user_id must be a positive user id".to_string(),
            ));
        }

        self.assigned_to = Some(user_id);
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::InProgress;
        }
        self.touch();
        Ok(())
    }

    pub fn complete(&mut self) -> TaskResult<()> {
        match self.status {
            TaskStatus::Completed => Err(TaskError::InvalidState(
                "task is already completed".to_string(),
            )),
            TaskStatus::Cancelled => Err(TaskError::InvalidState(
                "cannot complete a cancelled task".to_string(),
            )),
            TaskStatus::Pending | TaskStatus::InProgress => {
                self.mark_completed();
                Ok(())
            }
        }
    }

    pub fn cancel(&mut self) -> TaskResult<()> {
        match self.status {
            TaskStatus::Completed => Err(TaskError::InvalidState(
                "cannot cancel a completed task".to_string(),
            )),
            TaskStatus::Cancelled => Err(TaskError::InvalidState(
                "task is already cancelled".to_string(),
            )),
            TaskStatus::Pending | TaskStatus::InProgress => {
                self.status = TaskStatus::Cancelled;
                self.touch();
                Ok(())
            }
        }
    }

    /// Merges the present fields of `update`.
    ///
    /// The status change is checked before anything is written, so a
    /// rejected update leaves the task untouched. Field rules are not
    /// re-checked here; call [`validate`](Self::validate) afterwards.
    pub fn apply_update(&mut self, update: UpdateTask) -> TaskResult<()> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(TaskError::InvalidState(format!(
                    "cannot change status from {} to {}",
                    self.status, next
                )));
            }
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        match update.status {
            Some(TaskStatus::Completed) if self.status != TaskStatus::Completed => {
                self.mark_completed()
            }
            Some(next) => self.status = next,
            None => {}
        }

        self.touch();
        Ok(())
    }

    fn mark_completed(&mut self) {
        let now = now();
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now.max(self.created_at));
        self.updated_at = now;
    }

    fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Current time at the microsecond precision Postgres stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Returns the client-facing message for a bad task name.
fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("task name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "task name is too long (max {MAX_NAME_LENGTH} characters)"
        ));
    }
    Ok(())
}

fn validate_task_name(name: &str) -> Result<(), ValidationError> {
    check_name(name)
        .map_err(|message| ValidationError::new("task_name").with_message(Cow::Owned(message)))
}

/// DTO for creating a new task
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTask {
    #[validate(custom(function = "validate_task_name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[validate(range(min = 1, message = "created_by must be a positive user id"))]
    pub created_by: i64,
}

/// DTO for updating an existing task. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Body of `POST /tasks/{id}/assign`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTask {
    #[serde(default)]
    pub user_id: i64,
}

/// Body returned by the assign, complete and cancel endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Normalized list filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i64>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            assigned_to: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl TaskFilter {
    /// Replaces a zero limit with the default and caps it at the maximum.
    pub fn normalized(mut self) -> Self {
        self.limit = match self.limit {
            0 => DEFAULT_LIST_LIMIT,
            limit => limit.min(MAX_LIST_LIMIT),
        };
        self
    }
}

/// Raw query string of `GET /tasks`.
///
/// Everything is taken as text so that a malformed number can fall back to
/// its default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// pending, in_progress, completed or cancelled
    pub status: Option<String>,
    /// low, medium or high
    pub priority: Option<String>,
    /// Assignee user id; ignored when not a number
    pub assigned_to: Option<String>,
    /// Page size, default 50, max 100
    pub limit: Option<String>,
    /// Rows to skip, default 0
    pub offset: Option<String>,
}

impl ListTasksQuery {
    pub fn normalize(self) -> TaskResult<TaskFilter> {
        let status = parse_enum::<TaskStatus>(self.status.as_deref(), "status")?;
        let priority = parse_enum::<TaskPriority>(self.priority.as_deref(), "priority")?;

        let number = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());

        let limit = number(self.limit.as_deref())
            .filter(|limit| *limit > 0)
            .map_or(DEFAULT_LIST_LIMIT, |limit| limit as u64);
        let offset = number(self.offset.as_deref())
            .filter(|offset| *offset > 0)
            .map_or(0, |offset| offset as u64);

        Ok(TaskFilter {
            status,
            priority,
            assigned_to: number(self.assigned_to.as_deref()),
            limit,
            offset,
        }
        .normalized())
    }
}

fn parse_enum<T: FromStr>(raw: Option<&str>, field: &str) -> TaskResult<Option<T>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => T::from_str(value)
            .map(Some)
            .map_err(|_| TaskError::InvalidInput(format!("invalid {field}: {value}"))),
    }
}
