//! Liveness and readiness checks

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn status_code(self) -> StatusCode {
        match self {
            Self::Healthy => StatusCode::OK,
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<BackendCheck>,
}

/// Result of checking one dependency
#[derive(Debug, Serialize, Deserialize)]
pub struct BackendCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

impl HealthReport {
    fn new(checks: Vec<BackendCheck>) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthReport::new(Vec::new())))
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /ready
///
/// Only the vector search backend is checked; the embedding and generation
/// providers bill per call.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = HealthReport::new(vec![check_vector_search(&state).await]);
    (report.status.status_code(), Json(report))
}

async fn check_vector_search(state: &AppState) -> BackendCheck {
    let started = Instant::now();
    let gateway = state.answer_service.retrieval().gateway();

    let (status, message) = match gateway.health_check().await {
        Ok(true) => (HealthStatus::Healthy, None),
        Ok(false) => (
            HealthStatus::Unhealthy,
            Some("backend reported unhealthy".to_string()),
        ),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    BackendCheck {
        name: format!("vector_search:{}", gateway.backend_name()),
        status,
        message,
        latency_ms: started.elapsed().as_millis() as u64,
    }
}
