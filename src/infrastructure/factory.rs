//! Builds the collaborator adapters named in configuration

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::embedding::OpenAiEmbeddingProvider;
use super::http_client::HttpClient;
use super::llm::{GenerationParams, OpenAiGenerationClient};
use super::vector_store::{InMemoryVectorSearchGateway, PgvectorConfig, PgvectorSearchGateway};
use crate::config::{EmbeddingConfig, GenerationConfig, VectorStoreBackend, VectorStoreConfig};
use crate::domain::{DomainError, EmbeddingProvider, GenerationClient, VectorSearchGateway};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct CollaboratorFactory;

impl CollaboratorFactory {
    pub fn embedding(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        let api_key = read_secret(&config.api_key_env)?;
        let client = HttpClient::with_connect_timeout(CONNECT_TIMEOUT)?;

        let provider = OpenAiEmbeddingProvider::with_base_url(client, api_key, &config.base_url)
            .with_model(&config.model)
            .with_dimensions(config.dimensions);

        info!(model = %config.model, base_url = %config.base_url, "Embedding client configured");
        Ok(Arc::new(provider))
    }

    pub fn generation(config: &GenerationConfig) -> Result<Arc<dyn GenerationClient>, DomainError> {
        let api_key = read_secret(&config.api_key_env)?;
        let client = HttpClient::with_connect_timeout(CONNECT_TIMEOUT)?;

        let provider = OpenAiGenerationClient::with_base_url(client, api_key, &config.base_url)
            .with_params(GenerationParams {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            });

        info!(model = %config.model, base_url = %config.base_url, "Generation client configured");
        Ok(Arc::new(provider))
    }

    pub async fn vector_store(
        config: &VectorStoreConfig,
    ) -> Result<Arc<dyn VectorSearchGateway>, DomainError> {
        match config.backend {
            VectorStoreBackend::InMemory => {
                let gateway = match &config.corpus_path {
                    Some(path) => InMemoryVectorSearchGateway::from_json_file(path).await?,
                    None => {
                        warn!("No corpus_path configured, in-memory corpus is empty");
                        InMemoryVectorSearchGateway::default()
                    }
                };
                Ok(Arc::new(gateway))
            }
            VectorStoreBackend::Pgvector => {
                let url = read_secret(&config.database_url_env)?;
                let pg_config = PgvectorConfig::new(url)
                    .with_table_name(&config.table)
                    .with_max_connections(config.max_connections);

                let gateway = PgvectorSearchGateway::connect(&pg_config).await?;
                info!(table = %config.table, "pgvector search gateway connected");
                Ok(Arc::new(gateway))
            }
        }
    }
}

fn read_secret(env_name: &str) -> Result<String, DomainError> {
    match std::env::var(env_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DomainError::configuration(format!(
            "Environment variable {} is not set",
            env_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let err = read_secret("GROUNDED_QA_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("GROUNDED_QA_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn test_embedding_requires_key() {
        let config = EmbeddingConfig {
            api_key_env: "GROUNDED_QA_TEST_UNSET_EMBEDDING_KEY".to_string(),
            ..Default::default()
        };

        assert!(CollaboratorFactory::embedding(&config).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_without_corpus_is_empty() {
        let gateway = CollaboratorFactory::vector_store(&VectorStoreConfig::default())
            .await
            .unwrap();

        assert_eq!(gateway.backend_name(), "in_memory");
        assert!(gateway.search(&[1.0], 0.0, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pgvector_requires_database_url() {
        let config = VectorStoreConfig {
            backend: VectorStoreBackend::Pgvector,
            database_url_env: "GROUNDED_QA_TEST_UNSET_DATABASE_URL".to_string(),
            ..Default::default()
        };

        let err = CollaboratorFactory::vector_store(&config).await.err().unwrap();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
