//! Request correlation ids.
//!
//! The middleware stores the request and trace ids of the current HTTP request
//! in a tokio task-local so code far from the handler (event publishing, for
//! one) can stamp them on outbound messages without threading them through
//! every signature.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, Response},
    middleware::Next,
};
use std::future::Future;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Correlation ids for the request being served.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub trace_id: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            trace_id: Some(trace_id.into()),
        }
    }

    /// Builds a context from incoming headers, minting a trace id when the
    /// caller did not send one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        Self {
            request_id: header(REQUEST_ID_HEADER),
            trace_id: header(TRACE_ID_HEADER)
                .or_else(|| Some(uuid::Uuid::new_v4().simple().to_string())),
        }
    }

    /// The context of the request this task is serving, if any.
    pub fn current() -> Option<Self> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }

    /// Runs `future` with this context installed.
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        REQUEST_CONTEXT.scope(self, future).await
    }
}

/// Installs a [`RequestContext`] for the rest of the request and echoes the
/// trace id back to the caller.
///
/// Must run inside the request-id layer so `x-request-id` is already set.
pub async fn request_context_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let context = RequestContext::from_headers(request.headers());
    let trace_id = context.trace_id.clone();

    tracing::Span::current().record("trace_id", trace_id.as_deref());

    let mut response = context.scope(next.run(request)).await;

    if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_current_is_none_outside_scope() {
        assert!(RequestContext::current().is_none());
    }

    #[tokio::test]
    async fn test_scope_exposes_context() {
        let ctx = RequestContext::new("req-1", "trace-1");
        let seen = ctx.clone().scope(async { RequestContext::current() }).await;
        assert_eq!(seen, Some(ctx));
    }

    #[test]
    fn test_from_headers_generates_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc"));

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.request_id.as_deref(), Some("abc"));
        assert_eq!(ctx.trace_id.as_deref().map(str::len), Some(32));
    }

    #[tokio::test]
    async fn test_middleware_propagates_ids_to_handler() {
        async fn echo() -> String {
            let ctx = RequestContext::current().unwrap_or_default();
            format!(
                "{}|{}",
                ctx.request_id.unwrap_or_default(),
                ctx.trace_id.unwrap_or_default()
            )
        }

        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(request_context_middleware));

        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "req-42")
            .header(TRACE_ID_HEADER, "trace-42")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[TRACE_ID_HEADER], "trace-42");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"req-42|trace-42");
    }
}
