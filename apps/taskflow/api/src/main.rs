use axum_helpers::shutdown_signal;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::PgTransactionManager;
use domain_tasks::{PgTaskRepository, TaskEventLogger, TaskService};
use lifecycle::LifecycleManager;
use std::sync::Arc;
use tracing::{info, warn};

mod components;
mod config;
mod openapi;
mod routes;

use components::{
    DatabaseComponent, HttpServerComponent, MessagingComponent, MetricsComponent,
    SubscriberComponent, TracingComponent,
};
use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);
    info!(
        app = config.app.name,
        version = config.app.version,
        "Starting taskflow API"
    );

    let database = Arc::new(DatabaseComponent::new(
        config.database.clone(),
        config.app.name,
    ));
    let metrics = Arc::new(MetricsComponent::new(config.metrics_enabled, config.app));
    let tracer = Arc::new(TracingComponent::new(config.tracing.clone(), config.app.name));
    let messaging = Arc::new(MessagingComponent::new(config.messaging.clone()));
    let subscriber = Arc::new(SubscriberComponent::new(
        config.messaging.clone(),
        Arc::new(TaskEventLogger),
    ));

    let mut lifecycle = LifecycleManager::new();
    lifecycle.register(metrics.clone());
    lifecycle.register(tracer);
    lifecycle.register(database.clone());
    lifecycle.register(messaging.clone());
    lifecycle.register(subscriber);

    if let Err(e) = lifecycle.start_all().await {
        let _ = lifecycle.stop_all().await;
        return Err(e.into());
    }

    let db = database
        .connection()
        .await
        .ok_or_else(|| eyre::eyre!("database component started without a connection"))?;

    let service = TaskService::new(
        PgTaskRepository::new(db.clone()),
        PgTransactionManager::new(db.clone()),
        messaging.task_publisher().await,
    );
    let app = routes::app(service, db, metrics.handle(), &config.server);

    let http = Arc::new(HttpServerComponent::new(app, config.server.clone()));
    lifecycle.register(http.clone());

    if let Err(e) = lifecycle.start_all().await {
        let _ = lifecycle.stop_all().await;
        return Err(e.into());
    }

    info!(addr = ?http.local_addr(), "Taskflow API ready");

    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown signal received"),
        _ = http.exited() => warn!("HTTP server exited unexpectedly"),
    }

    lifecycle.shutdown(config.server.shutdown_timeout).await?;

    info!("Taskflow API shutdown complete");
    Ok(())
}
