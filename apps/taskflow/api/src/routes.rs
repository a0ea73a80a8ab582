//! Top-level router: health checks, metrics and the task API.

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, create_router, health_router, run_health_checks};
use core_config::server::ServerConfig;
use database::postgres::{DatabaseConnection, TransactionManager, check_health};
use domain_tasks::{TaskRepository, TaskService, handlers};
use observability::{PrometheusHandle, render_metrics};

use crate::openapi::ApiDoc;

/// Routes without the shared middleware stack.
///
/// - `GET /health` liveness
/// - `GET /ready` database readiness
/// - `GET /metrics` Prometheus text
/// - `/tasks/...` task API
pub fn api_routes<R, X>(
    service: TaskService<R, X>,
    db: DatabaseConnection,
    metrics: Option<&'static PrometheusHandle>,
) -> Router
where
    R: TaskRepository + 'static,
    X: TransactionManager + 'static,
{
    Router::new()
        .merge(health_router())
        .merge(ready_router(db))
        .merge(metrics_router(metrics))
        .nest("/tasks", handlers::router(service))
}

/// [`api_routes`] wrapped with Swagger UI, the JSON 404 fallback and the
/// middleware stack.
pub fn app<R, X>(
    service: TaskService<R, X>,
    db: DatabaseConnection,
    metrics: Option<&'static PrometheusHandle>,
    server: &ServerConfig,
) -> Router
where
    R: TaskRepository + 'static,
    X: TransactionManager + 'static,
{
    create_router::<ApiDoc>(api_routes(service, db, metrics), server)
}

fn metrics_router(handle: Option<&'static PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(render))
        .with_state(handle)
}

async fn render(State(handle): State<Option<&'static PrometheusHandle>>) -> String {
    render_metrics(handle)
}

fn ready_router(db: DatabaseConnection) -> Router {
    Router::new().route("/ready", get(ready)).with_state(db)
}

async fn ready(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "database",
        Box::pin(async { check_health(&db).await.map_err(|e| e.to_string()) }),
    )];

    run_health_checks(checks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use database::postgres::NoopTransactionManager;
    use domain_tasks::{InMemoryTaskRepository, NoopTaskEventPublisher};
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn healthy_db() -> DatabaseConnection {
        let row = BTreeMap::from([("?column?", Value::Int(Some(1)))]);
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection()
    }

    fn unreachable_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    fn test_app(db: DatabaseConnection) -> Router {
        let service = TaskService::new(
            InMemoryTaskRepository::new(),
            NoopTransactionManager,
            Arc::new(NoopTaskEventPublisher),
        );
        app(service, db, None, &ServerConfig::default())
    }

    async fn send(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(test_app(unreachable_db()), "GET", "/health", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_ready_when_database_answers() {
        let (status, body) = send(test_app(healthy_db()), "GET", "/ready", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_not_ready_when_database_fails() {
        let (status, body) = send(test_app(unreachable_db()), "GET", "/ready", Body::empty()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["database"], "disconnected");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = test_app(unreachable_db())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"# Metrics not initialized\n");
    }

    #[tokio::test]
    async fn test_tasks_are_nested() {
        let app = test_app(unreachable_db());
        let create = Body::from(json!({ "name": "Ship it", "created_by": 3 }).to_string());

        let (status, task) = send(app.clone(), "POST", "/tasks", create).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, fetched) = send(app, "GET", &format!("/tasks/{}", task["id"]), Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Ship it");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(test_app(unreachable_db()), "GET", "/nope", Body::empty()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_openapi_lists_task_paths() {
        let (status, doc) = send(
            test_app(unreachable_db()),
            "GET",
            "/api-docs/openapi.json",
            Body::empty(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"].get("/tasks/{id}/complete").is_some());
        assert!(doc["components"]["responses"].get("NotFoundResponse").is_some());
    }
}
