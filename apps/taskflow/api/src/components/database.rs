use async_trait::async_trait;
use database::postgres::{
    DatabaseConnection, PostgresConfig, connect_from_config_with_retry, run_migrations,
};
use lifecycle::{BoxError, Component};
use migration::Migrator;
use observability::DatabaseMetrics;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

const POOL_SAMPLE_INTERVAL: Duration = Duration::from_secs(15);

/// Owns the PostgreSQL pool.
///
/// `start` connects (with retry), applies pending migrations and begins
/// sampling the pool into `db_connections_open`/`db_connections_idle`;
/// `stop` closes the pool.
pub struct DatabaseComponent {
    config: PostgresConfig,
    app_name: &'static str,
    connection: RwLock<Option<DatabaseConnection>>,
    pool_sampler: Mutex<Option<JoinHandle<()>>>,
}

impl DatabaseComponent {
    pub fn new(config: PostgresConfig, app_name: &'static str) -> Self {
        Self {
            config,
            app_name,
            connection: RwLock::new(None),
            pool_sampler: Mutex::new(None),
        }
    }

    /// The pool, once `start` has succeeded.
    pub async fn connection(&self) -> Option<DatabaseConnection> {
        self.connection.read().await.clone()
    }
}

#[async_trait]
impl Component for DatabaseComponent {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn start(&self) -> Result<(), BoxError> {
        let db = connect_from_config_with_retry(self.config.clone(), None).await?;
        run_migrations::<Migrator>(&db, self.app_name).await?;

        let sampled = db.clone();
        *self.pool_sampler.lock().await = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POOL_SAMPLE_INTERVAL);
            loop {
                ticker.tick().await;
                record_pool(&sampled);
            }
        }));

        *self.connection.write().await = Some(db);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        if let Some(sampler) = self.pool_sampler.lock().await.take() {
            sampler.abort();
        }
        if let Some(db) = self.connection.write().await.take() {
            db.close().await?;
            info!("PostgreSQL connection closed");
        }
        Ok(())
    }
}

fn record_pool(db: &DatabaseConnection) {
    let pool = db.get_postgres_connection_pool();
    DatabaseMetrics::set_connections(pool.size(), pool.num_idle());
}
