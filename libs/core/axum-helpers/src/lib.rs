//! # Axum Helpers
//!
//! Shared HTTP plumbing for the task service.
//!
//! ## Modules
//!
//! - **[`errors`]**: [`AppError`] and the JSON error body every endpoint returns
//! - **[`extractors`]**: extractors that reject with that body
//! - **[`server`]**: middleware stack, health and readiness, shutdown signal
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::create_router;
//! use core_config::server::ServerConfig;
//!
//! let app = create_router::<ApiDoc>(api_routes, &ServerConfig::default());
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(axum_helpers::shutdown_signal())
//!     .await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::JsonBody;
pub use server::{
    HealthCheckFuture, create_router, health_router, run_health_checks, shutdown_signal,
};
