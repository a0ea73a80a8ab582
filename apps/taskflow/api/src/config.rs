use core_config::{AppInfo, FromEnv, app_info, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use messaging::MessagingConfig;
use observability::otel::TracingConfig;

pub use core_config::Environment;

/// Application configuration, composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub messaging: MessagingConfig,
    pub tracing: TracingConfig,
    /// `METRICS_ENABLED`, default `true`
    pub metrics_enabled: bool,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080
        let database = PostgresConfig::from_env()?; // DATABASE_URL is required
        let messaging = MessagingConfig::from_env()?;
        let tracing = TracingConfig::from_env()?;
        let metrics_enabled = env_parse("METRICS_ENABLED", "true")?;

        Ok(Self {
            app: app_info!(),
            server,
            database,
            messaging,
            tracing,
            metrics_enabled,
            environment,
        })
    }
}
