//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus handle for serving the metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the Prometheus recorder, or return None when disabled
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("grounded_qa_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Prometheus metrics");
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record one HTTP request; `path` should be the matched route
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record the end of one answer
pub fn record_answer(mode: &'static str, outcome: &'static str, duration: Duration) {
    let labels = [("mode", mode), ("outcome", outcome)];

    counter!("answers_total", &labels).increment(1);
    histogram!("answer_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record what retrieval produced for one question
pub fn record_retrieval(sources: usize, fallback_used: bool) {
    histogram!("retrieval_sources").record(sources as f64);

    if sources == 0 {
        counter!("retrieval_empty_total").increment(1);
    }

    if fallback_used {
        counter!("retrieval_fallback_total").increment(1);
    }
}

pub fn record_stream_fragments(fragments: usize) {
    counter!("stream_fragments_total").increment(fragments as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_http_request("POST", "/v1/answers", 200, Duration::from_millis(5));
        record_answer("sync", "completed", Duration::from_millis(5));
        record_retrieval(0, true);
        record_stream_fragments(3);
    }

    #[test]
    fn test_disabled_metrics_returns_none() {
        assert!(init_metrics(&MetricsConfig { enabled: false }).is_none());
    }
}
