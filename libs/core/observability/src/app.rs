//! Process-level metrics: build info and uptime.

use metrics::gauge;
use std::time::Duration;

/// Application metrics recorder
pub struct AppMetrics;

impl AppMetrics {
    /// Constant `1` gauge labelled with the running service and version
    pub fn record_info(service: &'static str, version: &'static str) {
        gauge!("app_info", "service" => service, "version" => version).set(1.0);
    }

    pub fn record_uptime(uptime: Duration) {
        gauge!("app_uptime_seconds").set(uptime.as_secs_f64());
    }
}
