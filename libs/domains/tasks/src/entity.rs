use crate::models::{Task, TaskPriority, TaskStatus};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for Tasks table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Task {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            priority: model.priority,
            created_by: model.created_by,
            assigned_to: model.assigned_to,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            completed_at: model.completed_at.map(Into::into),
        }
    }
}

impl ActiveModel {
    /// Insert model; the id comes from the database.
    pub fn for_insert(task: &Task) -> Self {
        Self {
            id: NotSet,
            created_by: Set(task.created_by),
            created_at: Set(task.created_at.into()),
            ..Self::for_update(task)
        }
    }

    /// The mutable columns of `task`. `created_by` and `created_at` are
    /// only written on insert.
    pub fn for_update(task: &Task) -> Self {
        Self {
            id: Set(task.id),
            name: Set(task.name.clone()),
            description: Set(task.description.clone()),
            status: Set(task.status),
            priority: Set(task.priority),
            created_by: NotSet,
            assigned_to: Set(task.assigned_to),
            created_at: NotSet,
            updated_at: Set(task.updated_at.into()),
            completed_at: Set(task.completed_at.map(Into::into)),
        }
    }
}
