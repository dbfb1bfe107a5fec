//! Embedding client capability

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Converts text into a fixed-dimension vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::mock::MockEmbeddingProvider;
    use super::*;

    #[tokio::test]
    async fn test_deterministic_embeddings() {
        let provider = MockEmbeddingProvider::new(16);

        let first = provider.embed("Hello").await.unwrap();
        let second = provider.embed("Hello").await.unwrap();

        assert_eq!(first.len(), 16);
        assert_eq!(first, second);
        assert_eq!(provider.calls(), vec!["Hello", "Hello"]);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockEmbeddingProvider::new(16).with_error("API error");
        assert!(provider.embed("Hello").await.is_err());
    }
}
