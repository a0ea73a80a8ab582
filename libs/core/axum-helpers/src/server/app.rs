use crate::errors::handlers::{handle_panic, not_found};
use axum::{Router, body::Body, http::Request, http::StatusCode, middleware};
use core_config::server::ServerConfig;
use observability::{REQUEST_ID_HEADER, metrics_middleware, request_context_middleware};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Wraps `apis` with API docs, a JSON 404 fallback and the shared middleware
/// stack.
///
/// Request flow, outermost first:
///
/// 1. `x-request-id` assigned (UUID when absent) and echoed on the response
/// 2. trace span per request (`method`, `uri`, `request_id`, `trace_id`)
/// 3. [`RequestContext`](observability::RequestContext) installed, `x-trace-id` echoed
/// 4. HTTP metrics
/// 5. timeout from `server_config.request_timeout` (`408`)
/// 6. panics turned into the standard `500` body
///
/// ```ignore
/// let apis = Router::new()
///     .merge(health_router())
///     .nest("/tasks", domain_tasks::handlers::router(service));
///
/// let app = create_router::<ApiDoc>(apis, &config.server);
/// ```
pub fn create_router<T>(apis: Router, server_config: &ServerConfig) -> Router
where
    T: OpenApi + 'static,
{
    info!(
        timeout = ?server_config.request_timeout,
        "Building HTTP router"
    );

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
                trace_id = tracing::field::Empty,
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(apis)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(trace_layer)
                .layer(middleware::from_fn(request_context_middleware))
                .layer(middleware::from_fn(metrics_middleware))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    server_config.request_timeout,
                ))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}
