use async_trait::async_trait;
use core_config::tracing::set_export_layer;
use lifecycle::{BoxError, Component};
use observability::otel::{self, SdkTracerProvider, TracingConfig};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Exports spans over OTLP while running.
///
/// `start` builds the tracer provider and slots its layer into the
/// subscriber; `stop` removes the layer and flushes pending spans.
pub struct TracingComponent {
    config: TracingConfig,
    service_name: &'static str,
    provider: Mutex<Option<SdkTracerProvider>>,
}

impl TracingComponent {
    pub fn new(config: TracingConfig, service_name: &'static str) -> Self {
        Self {
            config,
            service_name,
            provider: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Component for TracingComponent {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn start(&self) -> Result<(), BoxError> {
        if !self.config.enabled {
            info!("Span export disabled (TRACING_ENABLED=false)");
            return Ok(());
        }

        let provider = otel::build_provider(&self.config, self.service_name)?;
        if !set_export_layer(Some(otel::export_layer(&provider, self.service_name))) {
            warn!("Tracing subscriber has no export slot; spans stay local");
        }

        info!(
            endpoint = %self.config.endpoint,
            sampling_rate = self.config.sampling_rate,
            "Span export enabled"
        );
        *self.provider.lock().await = Some(provider);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        let Some(provider) = self.provider.lock().await.take() else {
            return Ok(());
        };

        set_export_layer(None);
        // Shutdown blocks until the batch exporter thread has flushed.
        tokio::task::spawn_blocking(move || provider.shutdown())
            .await?
            .map_err(|e| format!("failed to shut down tracer provider: {e}"))?;

        info!("Span export stopped");
        Ok(())
    }
}
