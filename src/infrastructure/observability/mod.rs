//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_answer, record_http_request, record_retrieval,
    record_stream_fragments, PrometheusMetrics,
};
