use async_trait::async_trait;
use axum::Router;
use core_config::server::ServerConfig;
use lifecycle::{BoxError, Component};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Serves the router on a background task.
///
/// `stop` flips a watch signal that drives axum's graceful shutdown, then
/// waits for in-flight requests to finish.
pub struct HttpServerComponent {
    config: ServerConfig,
    router: Mutex<Option<Router>>,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
    local_addr: OnceLock<SocketAddr>,
    shutdown: watch::Sender<bool>,
    exited: watch::Sender<bool>,
}

impl HttpServerComponent {
    pub fn new(router: Router, config: ServerConfig) -> Self {
        Self {
            config,
            router: Mutex::new(Some(router)),
            task: Mutex::new(None),
            local_addr: OnceLock::new(),
            shutdown: watch::Sender::new(false),
            exited: watch::Sender::new(false),
        }
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Resolves when the server task ends, whether by shutdown or failure.
    pub async fn exited(&self) {
        let mut exited = self.exited.subscribe();
        let _ = exited.wait_for(|done| *done).await;
    }
}

#[async_trait]
impl Component for HttpServerComponent {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn start(&self) -> Result<(), BoxError> {
        let router = self
            .router
            .lock()
            .await
            .take()
            .ok_or("HTTP server can only be started once")?;

        let listener = TcpListener::bind(self.config.address()).await?;
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);
        info!(%addr, "HTTP server listening");

        let mut shutdown = self.shutdown.subscribe();
        let exited = self.exited.clone();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                })
                .await;

            if let Err(e) = &result {
                error!(error = %e, "HTTP server failed");
            }
            exited.send_replace(true);
            result
        });

        *self.task.lock().await = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.shutdown.send_replace(true);

        if let Some(handle) = self.task.lock().await.take() {
            handle.await??;
            info!("HTTP server stopped");
        }
        Ok(())
    }
}
