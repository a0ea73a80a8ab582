//! Component lifecycle orchestration.
//!
//! Long-lived infrastructure (metrics recorder, database pool, message broker
//! connection, HTTP listener) is wrapped in a [`Component`] and registered
//! with a [`LifecycleManager`] in dependency order. Startup walks the list
//! forwards; shutdown walks it backwards so the HTTP server stops accepting
//! work before the resources it depends on go away.
//!
//! ```text
//! register:  metrics → database → messaging → http
//! start_all: metrics → database → messaging → http   (stop at first failure)
//! stop_all:  http → messaging → database → metrics   (best effort)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let mut lifecycle = LifecycleManager::new();
//! lifecycle.register(Arc::new(DatabaseComponent::new(config.database)));
//! lifecycle.register(Arc::new(HttpServerComponent::new(router, config.server)));
//!
//! lifecycle.start_all().await?;
//! shutdown_signal().await;
//! lifecycle.shutdown(Duration::from_secs(30)).await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

/// Error type components report from `start`/`stop`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Default bound for a full shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to start component '{component}': {source}")]
    Start {
        component: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to stop component '{component}': {source}")]
    Stop {
        component: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("shutdown did not complete within {0:?}")]
    Timeout(Duration),
}

/// A piece of infrastructure with an explicit start and stop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Component: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    async fn start(&self) -> Result<(), BoxError>;

    async fn stop(&self) -> Result<(), BoxError>;
}

/// Ordered registry of components.
#[derive(Default)]
pub struct LifecycleManager {
    components: Vec<Arc<dyn Component>>,
    /// Number of leading components whose `start` succeeded
    started: usize,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component. Registration order is dependency order.
    pub fn register(&mut self, component: Arc<dyn Component>) {
        info!(component = component.name(), "Registered component");
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Starts components in registration order, stopping at the first
    /// failure. Components started before the failure stay running until
    /// [`stop_all`](Self::stop_all).
    #[instrument(skip(self), fields(components = self.components.len()))]
    pub async fn start_all(&mut self) -> Result<(), LifecycleError> {
        for component in self.components.iter().skip(self.started) {
            let name = component.name();
            info!(component = name, "Starting component");

            component
                .start()
                .await
                .map_err(|source| LifecycleError::Start {
                    component: name,
                    source,
                })?;

            self.started += 1;
            info!(component = name, "Component started");
        }

        Ok(())
    }

    /// Stops started components in reverse registration order.
    ///
    /// Every component gets a stop attempt even if an earlier one failed. Each
    /// failure is logged; the last one is returned.
    #[instrument(skip(self), fields(started = self.started))]
    pub async fn stop_all(&mut self) -> Result<(), LifecycleError> {
        let mut last_error = None;

        for component in self.components[..self.started].iter().rev() {
            let name = component.name();
            info!(component = name, "Stopping component");

            match component.stop().await {
                Ok(()) => info!(component = name, "Component stopped"),
                Err(source) => {
                    error!(component = name, error = %source, "Failed to stop component");
                    last_error = Some(LifecycleError::Stop {
                        component: name,
                        source,
                    });
                }
            }
        }

        self.started = 0;

        match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// [`stop_all`](Self::stop_all) bounded by `timeout`.
    pub async fn shutdown(&mut self, timeout: Duration) -> Result<(), LifecycleError> {
        info!(?timeout, "Shutting down components");

        match tokio::time::timeout(timeout, self.stop_all()).await {
            Ok(result) => result,
            Err(_) => {
                error!(?timeout, "Shutdown timed out");
                Err(LifecycleError::Timeout(timeout))
            }
        }
    }
}
