use crate::Environment;
use std::sync::OnceLock;
use tracing::{debug, info};
use tracing_subscriber::{layer::Layer, prelude::*, registry::Registry, reload, EnvFilter};

/// Span export layer slotted under the formatting layers, e.g. OpenTelemetry.
pub type ExportLayer = Box<dyn Layer<Registry> + Send + Sync>;

static EXPORT_LAYER: OnceLock<reload::Handle<Option<ExportLayer>, Registry>> = OnceLock::new();

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): JSON lines, module targets hidden.
/// - **Development** (default): pretty-printed output.
///
/// Both include `tracing_error::ErrorLayer` so `eyre` reports carry span traces.
/// `RUST_LOG` overrides the default filter.
///
/// An empty export slot sits at the bottom of the stack; fill it later with
/// [`set_export_layer`].
///
/// Calling it again after a subscriber is installed is a no-op, which keeps
/// tests that initialize tracing independently from interfering.
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info,sea_orm=warn,sqlx=warn")
        } else {
            EnvFilter::new("debug,sqlx=info,hyper=info")
        }
    });

    let (export, export_handle) = reload::Layer::new(None::<ExportLayer>);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(export)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(export)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            let _ = EXPORT_LAYER.set(export_handle);
            info!(?environment, "Tracing initialized");
        }
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}

/// Installs (`Some`) or removes (`None`) the span export layer.
///
/// Returns `false` when the global subscriber was not installed by
/// [`init_tracing`], leaving nothing to swap.
pub fn set_export_layer(layer: Option<ExportLayer>) -> bool {
    match EXPORT_LAYER.get() {
        Some(handle) => handle.reload(layer).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_multiple_calls() {
        init_tracing(&Environment::Development);
        init_tracing(&Environment::Production);
    }

    #[test]
    fn test_export_layer_can_be_swapped() {
        init_tracing(&Environment::Development);

        let layer: ExportLayer = Box::new(tracing_subscriber::layer::Identity::new());
        assert!(set_export_layer(Some(layer)));
        info!("exported through the swapped layer");
        assert!(set_export_layer(None));
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            init_tracing(&Environment::Production);
        });
    }
}
