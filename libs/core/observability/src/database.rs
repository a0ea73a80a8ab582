//! Database query and pool metrics.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Database metrics recorder
pub struct DatabaseMetrics;

impl DatabaseMetrics {
    /// Record one repository statement and how long it took
    pub fn record_query(operation: &'static str, elapsed: Duration, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        counter!("db_queries_total", "operation" => operation, "status" => status).increment(1);
        histogram!("db_query_duration_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());
    }

    /// Snapshot of the connection pool
    pub fn set_connections(open: u32, idle: usize) {
        gauge!("db_connections_open").set(f64::from(open));
        gauge!("db_connections_idle").set(idle as f64);
    }
}
