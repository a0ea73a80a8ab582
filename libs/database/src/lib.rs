//! PostgreSQL plumbing shared by the task service.
//!
//! - [`postgres`]: pool configuration, connecting with retry, migrations,
//!   health checks and the ambient [`TransactionManager`](postgres::TransactionManager)
//! - [`retry`]: exponential backoff for startup connections
//! - [`DatabaseError`]: error type for the non-ORM helpers
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "taskflow").await?;
//! ```

mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::RetryConfig;
