//! PostgreSQL connection management, migrations, health checks and
//! transactions.

mod config;
mod connector;
mod health;
pub mod transaction;

pub use config::PostgresConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry, run_migrations};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use transaction::{
    NoopTransactionManager, PgTransactionManager, TransactionManager, current_transaction,
};

pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
pub use sea_orm_migration::MigratorTrait;
