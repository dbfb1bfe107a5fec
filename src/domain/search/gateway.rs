//! Vector search gateway capability

use async_trait::async_trait;

use crate::domain::knowledge::RetrievedChunk;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Similarity search over the pre-embedded corpus
///
/// Implementations return at most `limit` chunks whose similarity is at least
/// `threshold`, ordered by descending similarity. Equal scores keep corpus
/// insertion (id) order so repeated searches are stable.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorSearchGateway: Send + Sync {
    /// Find chunks similar to the query vector
    async fn search(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, DomainError>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> Result<bool, DomainError>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}
