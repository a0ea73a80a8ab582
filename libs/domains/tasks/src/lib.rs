//! Tasks Domain
//!
//! Task lifecycle management: creation, assignment, completion, cancellation
//! and deletion, with a domain event published for every state change.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP mapping, path/query parsing
//! └──────┬──────┘
//! ┌──────▼──────┐      ┌────────────────────┐
//! │   Service   │ ───▶ │ TaskEventPublisher │  ← best effort
//! └──────┬──────┘      └────────────────────┘
//!        │ within_transaction
//! ┌──────▼──────┐
//! │ Repository  │  ← Postgres or in-memory
//! └──────┬──────┘
//! ┌──────▼──────┐
//! │   Models    │  ← Task entity and its state machine
//! └─────────────┘
//! ```
//!
//! # State machine
//!
//! ```text
//!            assign                complete
//! pending ──────────▶ in_progress ──────────▶ completed
//!    │                     │
//!    │ cancel              │ cancel
//!    └─────────────────────┴────────────────▶ cancelled
//! ```
//!
//! A pending task can also be completed directly. `completed` and
//! `cancelled` are terminal.
//!
//! Events read back from the broker are handled by [`TaskEventLogger`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use database::postgres::PgTransactionManager;
//! use domain_tasks::{NoopTaskEventPublisher, PgTaskRepository, TaskService};
//! use sea_orm::Database;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//!
//! let service = TaskService::new(
//!     PgTaskRepository::new(db.clone()),
//!     PgTransactionManager::new(db),
//!     Arc::new(NoopTaskEventPublisher),
//! );
//! let router = domain_tasks::handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod consumer;
pub mod entity;
pub mod error;
pub mod events;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use consumer::TaskEventLogger;
pub use error::{TaskError, TaskResult};
pub use events::{
    BrokerTaskEventPublisher, NoopTaskEventPublisher, TaskCompletedEvent, TaskCreatedEvent,
    TaskDeletedEvent, TaskEventPublisher, TaskEventType, TaskUpdatedEvent,
};
pub use handlers::TasksApiDoc;
pub use memory::InMemoryTaskRepository;
pub use models::{
    AssignTask, CreateTask, ListTasksQuery, MessageResponse, Task, TaskFilter, TaskPriority,
    TaskStatus, UpdateTask,
};
pub use postgres::PgTaskRepository;
pub use repository::TaskRepository;
pub use service::TaskService;
