use std::time::Duration;

use serde::Deserialize;

use crate::domain::query::QueryLimits;
use crate::domain::retrieval::RetrievalPolicy;
use crate::domain::stream::StreamSettings;
use crate::domain::DomainError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub vector_store: VectorStoreConfig,
    pub stream: StreamConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub similarity_threshold: f32,
    pub match_count: usize,
    /// Lower threshold tried once when nothing clears the first one
    pub fallback_threshold: Option<f32>,
    pub max_chars_per_chunk: usize,
    pub max_query_chars: usize,
    pub max_document_chars: usize,
    pub collaborator_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub dimensions: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Longest gap between streamed fragments before the answer is abandoned
    pub fragment_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreBackend {
    #[default]
    InMemory,
    Pgvector,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    /// JSON corpus for the in-memory backend
    pub corpus_path: Option<String>,
    pub database_url_env: String,
    pub table: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub channel_capacity: usize,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let policy = RetrievalPolicy::default();
        let limits = QueryLimits::default();

        Self {
            similarity_threshold: policy.similarity_threshold,
            match_count: policy.match_count,
            fallback_threshold: policy.fallback_threshold,
            max_chars_per_chunk: policy.max_chars_per_chunk,
            max_query_chars: limits.max_query_chars,
            max_document_chars: limits.max_document_chars,
            collaborator_timeout_ms: policy.collaborator_timeout_ms,
        }
    }
}

impl RetrievalConfig {
    pub fn policy(&self) -> RetrievalPolicy {
        RetrievalPolicy {
            similarity_threshold: self.similarity_threshold,
            match_count: self.match_count,
            fallback_threshold: self.fallback_threshold,
            max_chars_per_chunk: self.max_chars_per_chunk,
            collaborator_timeout_ms: self.collaborator_timeout_ms,
        }
    }

    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            max_query_chars: self.max_query_chars,
            max_document_chars: self.max_document_chars,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dimensions: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: Some(0.2),
            max_tokens: Some(1024),
            fragment_timeout_ms: None,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::default(),
            corpus_path: None,
            database_url_env: "DATABASE_URL".to_string(),
            table: "knowledge_chunks".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            keep_alive_secs: 15,
        }
    }
}

impl StreamConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_env(None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env(
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject values that would break retrieval or streaming at runtime
    pub fn validate(&self) -> Result<(), DomainError> {
        self.retrieval.policy().validate()?;

        if self.retrieval.max_query_chars == 0 || self.retrieval.max_document_chars == 0 {
            return Err(DomainError::configuration(
                "max_query_chars and max_document_chars must be at least 1",
            ));
        }

        if self.stream.channel_capacity == 0 {
            return Err(DomainError::configuration(
                "stream.channel_capacity must be at least 1",
            ));
        }

        if self.generation.fragment_timeout_ms == Some(0) {
            return Err(DomainError::configuration(
                "generation.fragment_timeout_ms must be at least 1 when set",
            ));
        }

        if self.vector_store.backend == VectorStoreBackend::Pgvector
            && self.vector_store.max_connections == 0
        {
            return Err(DomainError::configuration(
                "vector_store.max_connections must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            channel_capacity: self.stream.channel_capacity,
            fragment_timeout: self
                .generation
                .fragment_timeout_ms
                .map(Duration::from_millis),
        }
    }
}
