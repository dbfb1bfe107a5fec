//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, GenerationConfig, LogFormat, LoggingConfig, MetricsConfig,
    RetrievalConfig, ServerConfig, StreamConfig, VectorStoreBackend, VectorStoreConfig,
};
