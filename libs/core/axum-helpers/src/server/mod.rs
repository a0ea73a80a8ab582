//! Server infrastructure: middleware stack, health endpoints, shutdown.

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::create_router;
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::shutdown_signal;
