//! Task lifecycle metrics.

use metrics::{counter, histogram};
use std::time::Duration;

/// Task metrics recorder
pub struct TaskMetrics;

impl TaskMetrics {
    /// Record a task creation
    pub fn record_created(priority: &str) {
        counter!("tasks_created_total", "priority" => priority.to_string()).increment(1);
    }

    /// Record a task reaching the completed status
    pub fn record_completed() {
        counter!("tasks_completed_total").increment(1);
    }

    /// Record a failed task operation
    pub fn record_failed(operation: &'static str, kind: &'static str) {
        counter!("tasks_failed_total", "operation" => operation, "kind" => kind).increment(1);

        tracing::debug!(operation, kind, "Recorded failed task operation");
    }

    /// Record how long a task operation took, successful or not
    pub fn record_duration(operation: &'static str, elapsed: Duration) {
        histogram!("task_processing_duration_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());
    }

    /// Record an event the broker did not accept
    pub fn record_publish_failure(event_type: &'static str) {
        counter!("task_events_publish_failures_total", "event_type" => event_type).increment(1);
    }
}
