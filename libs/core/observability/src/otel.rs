//! OpenTelemetry span export.
//!
//! Builds an OTLP/HTTP tracer provider and the `tracing` layer that feeds it.
//! The layer is installed into the subscriber by the caller, see
//! `core_config::tracing::set_export_layer`.

use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::Sampler;
use thiserror::Error;
use tracing_subscriber::{Layer, registry::Registry};

pub use opentelemetry_sdk::trace::SdkTracerProvider;

/// Span export settings.
///
/// Environment variables:
/// - `TRACING_ENABLED` (default `false`)
/// - `TRACING_ENDPOINT` (default `http://localhost:4318/v1/traces`)
/// - `TRACING_SAMPLING_RATE` (default `1.0`, within `0.0..=1.0`)
#[derive(Debug, Clone, PartialEq)]
pub struct TracingConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:4318/v1/traces".to_string(),
            sampling_rate: 1.0,
        }
    }
}

impl FromEnv for TracingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sampling_rate: f64 = env_parse("TRACING_SAMPLING_RATE", "1.0")?;
        if !(0.0..=1.0).contains(&sampling_rate) {
            return Err(ConfigError::ParseError {
                key: "TRACING_SAMPLING_RATE".to_string(),
                details: format!("{sampling_rate} is outside 0.0..=1.0"),
            });
        }

        Ok(Self {
            enabled: env_parse("TRACING_ENABLED", "false")?,
            endpoint: env_or_default("TRACING_ENDPOINT", "http://localhost:4318/v1/traces"),
            sampling_rate,
        })
    }
}

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("failed to build span exporter for {endpoint}: {details}")]
    Exporter { endpoint: String, details: String },
}

/// Batch-exporting provider sampling `config.sampling_rate` of root traces.
///
/// Also registered as the global OpenTelemetry provider. Building does not
/// contact the collector.
pub fn build_provider(
    config: &TracingConfig,
    service_name: &'static str,
) -> Result<SdkTracerProvider, TracerError> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(config.endpoint.clone())
        .build()
        .map_err(|e| TracerError::Exporter {
            endpoint: config.endpoint.clone(),
            details: e.to_string(),
        })?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            config.sampling_rate,
        ))))
        .with_resource(Resource::builder().with_service_name(service_name).build())
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    Ok(provider)
}

/// `tracing` layer turning spans into OpenTelemetry spans on `provider`.
pub fn export_layer(
    provider: &SdkTracerProvider,
    service_name: &'static str,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    tracing_opentelemetry::layer::<Registry>()
        .with_tracer(provider.tracer(service_name))
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 3] = ["TRACING_ENABLED", "TRACING_ENDPOINT", "TRACING_SAMPLING_RATE"];

    #[test]
    fn test_defaults_disable_export() {
        temp_env::with_vars_unset(VARS, || {
            assert_eq!(TracingConfig::from_env().unwrap(), TracingConfig::default());
        });
    }

    #[test]
    fn test_sampling_rate_out_of_range() {
        temp_env::with_var("TRACING_SAMPLING_RATE", Some("1.5"), || {
            let err = TracingConfig::from_env().unwrap_err();
            assert!(
                matches!(err, ConfigError::ParseError { ref key, .. } if key == "TRACING_SAMPLING_RATE")
            );
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("TRACING_ENABLED", Some("true")),
                ("TRACING_ENDPOINT", Some("http://collector:4318/v1/traces")),
                ("TRACING_SAMPLING_RATE", Some("0.25")),
            ],
            || {
                let config = TracingConfig::from_env().unwrap();
                assert!(config.enabled);
                assert_eq!(config.endpoint, "http://collector:4318/v1/traces");
                assert_eq!(config.sampling_rate, 0.25);
            },
        );
    }

    #[test]
    fn test_provider_builds_without_collector() {
        let config = TracingConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:1/v1/traces".to_string(),
            sampling_rate: 0.5,
        };

        let provider = build_provider(&config, "observability-test").unwrap();
        let _layer = export_layer(&provider, "observability-test");
        provider.shutdown().unwrap();
    }
}
