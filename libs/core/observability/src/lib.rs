//! Observability utilities for the task service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Task lifecycle counters ([`TaskMetrics`])
//! - Database query timings and pool gauges ([`DatabaseMetrics`])
//! - Build info and uptime gauges ([`AppMetrics`])
//! - OpenTelemetry span export ([`otel`])
//! - Axum middleware for automatic request metrics
//! - Request correlation ids carried through a task-local [`RequestContext`]
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, TaskMetrics};
//!
//! let handle = init_metrics()?;
//! TaskMetrics::record_created("high");
//!
//! let body = render_metrics(Some(handle));
//! ```

pub mod app;
pub mod context;
pub mod database;
pub mod middleware;
pub mod otel;
pub mod tasks;

pub use app::AppMetrics;

pub use context::{REQUEST_ID_HEADER, RequestContext, TRACE_ID_HEADER, request_context_middleware};
pub use database::DatabaseMetrics;
pub use middleware::metrics_middleware;
pub use tasks::TaskMetrics;

pub use metrics::{counter, gauge, histogram};
pub use metrics_exporter_prometheus::{BuildError, PrometheusHandle};

use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::time::Instant;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
static STARTED_AT: OnceCell<Instant> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// The recorder is process-wide; later calls return the handle installed by
/// the first one.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();
        let _ = STARTED_AT.set(Instant::now());

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition for `GET /metrics`.
///
/// Refreshes `app_uptime_seconds` before rendering.
pub fn render_metrics(handle: Option<&PrometheusHandle>) -> String {
    match handle {
        Some(handle) => {
            if let Some(started) = STARTED_AT.get() {
                AppMetrics::record_uptime(started.elapsed());
            }
            handle.render()
        }
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );
    describe_gauge!(
        "http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Task metrics
    describe_counter!("tasks_created_total", "Total number of tasks created");
    describe_counter!("tasks_completed_total", "Total number of tasks completed");
    describe_counter!(
        "tasks_failed_total",
        "Total number of failed task operations"
    );
    describe_histogram!(
        "task_processing_duration_seconds",
        "Task operation duration in seconds"
    );
    describe_counter!(
        "task_events_publish_failures_total",
        "Task events that could not be handed to the broker"
    );

    // Database metrics
    describe_counter!("db_queries_total", "Total number of repository statements");
    describe_histogram!(
        "db_query_duration_seconds",
        "Repository statement duration in seconds"
    );
    describe_gauge!("db_connections_open", "Connections currently held by the pool");
    describe_gauge!("db_connections_idle", "Idle connections in the pool");

    // Application metrics
    describe_gauge!("app_info", "Service name and version, always 1");
    describe_gauge!("app_uptime_seconds", "Seconds since the metrics recorder was installed");
}
