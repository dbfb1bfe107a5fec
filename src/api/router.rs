use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Build the full HTTP surface. `/metrics` is mounted only when a recorder
/// was installed.
pub fn create_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::MockGenerationClient;
    use crate::domain::retrieval::{RetrievalOrchestrator, RetrievalPolicy};
    use crate::domain::search::MockVectorSearchGateway;
    use crate::domain::{DomainError, VectorSearchGateway};
    use crate::infrastructure::services::AnswerService;
    use crate::infrastructure::vector_store::InMemoryVectorSearchGateway;

    fn state_with(gateway: Arc<dyn VectorSearchGateway>) -> AppState {
        let retrieval = RetrievalOrchestrator::new(
            Arc::new(MockEmbeddingProvider::new(2)),
            gateway,
            RetrievalPolicy::default(),
        );
        let service = AnswerService::new(retrieval, Arc::new(MockGenerationClient::new(&[])));
        AppState::new(Arc::new(service))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_live() {
        let app = create_router(
            state_with(Arc::new(InMemoryVectorSearchGateway::default())),
            None,
        );

        let health = app.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let live = app.oneshot(get_request("/live")).await.unwrap();
        assert_eq!(live.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_reports_backend() {
        let app = create_router(
            state_with(Arc::new(InMemoryVectorSearchGateway::default())),
            None,
        );

        let response = app.oneshot(get_request("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"][0]["name"], "vector_search:in_memory");
    }

    #[tokio::test]
    async fn test_ready_fails_when_backend_down() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_health_check()
            .returning(|| Err(DomainError::provider("pgvector", "connection refused")));
        gateway.expect_backend_name().return_const("pgvector");

        let app = create_router(state_with(Arc::new(gateway)), None);
        let response = app.oneshot(get_request("/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_without_recorder() {
        let app = create_router(
            state_with(Arc::new(InMemoryVectorSearchGateway::default())),
            None,
        );

        let response = app.oneshot(get_request("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
