//! Infrastructure wrapped as lifecycle components.
//!
//! Registered in `main` in dependency order: metrics, tracing, database,
//! messaging, event subscriber, HTTP server.

mod database;
mod http;
mod messaging;
mod metrics;
mod subscriber;
mod telemetry;

pub use database::DatabaseComponent;
pub use http::HttpServerComponent;
pub use messaging::MessagingComponent;
pub use metrics::MetricsComponent;
pub use subscriber::SubscriberComponent;
pub use telemetry::TracingComponent;
