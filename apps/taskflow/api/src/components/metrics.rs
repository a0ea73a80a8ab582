use async_trait::async_trait;
use core_config::AppInfo;
use lifecycle::{BoxError, Component};
use observability::{AppMetrics, PrometheusHandle};
use std::sync::OnceLock;
use tracing::info;

/// Installs the Prometheus recorder and hands its handle to the router.
pub struct MetricsComponent {
    enabled: bool,
    app: AppInfo,
    handle: OnceLock<&'static PrometheusHandle>,
}

impl MetricsComponent {
    pub fn new(enabled: bool, app: AppInfo) -> Self {
        Self {
            enabled,
            app,
            handle: OnceLock::new(),
        }
    }

    /// Handle for rendering `/metrics`; `None` when disabled or not started.
    pub fn handle(&self) -> Option<&'static PrometheusHandle> {
        self.handle.get().copied()
    }
}

#[async_trait]
impl Component for MetricsComponent {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn start(&self) -> Result<(), BoxError> {
        if !self.enabled {
            info!("Metrics disabled (METRICS_ENABLED=false)");
            return Ok(());
        }

        let handle = observability::init_metrics()
            .map_err(|e| format!("failed to install metrics recorder: {e}"))?;
        AppMetrics::record_info(self.app.name, self.app.version);
        let _ = self.handle.set(handle);
        Ok(())
    }

    // The recorder lives for the whole process.
    async fn stop(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::app_info;

    #[tokio::test]
    async fn test_start_exposes_handle() {
        let component = MetricsComponent::new(true, app_info!());
        assert!(component.handle().is_none());

        component.start().await.unwrap();
        let rendered = observability::render_metrics(component.handle());
        assert!(rendered.contains(r#"app_info{service="taskflow_api""#));
        assert!(rendered.contains("app_uptime_seconds"));

        // A second start reuses the installed recorder.
        component.start().await.unwrap();
        component.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_has_no_handle() {
        let component = MetricsComponent::new(false, app_info!());

        component.start().await.unwrap();
        assert!(component.handle().is_none());
    }
}
