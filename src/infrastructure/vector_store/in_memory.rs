//! In-memory vector search over a pre-embedded corpus file
//!
//! Used for local development and tests; the corpus is loaded once and never
//! mutated.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::embedding::cosine_similarity;
use crate::domain::knowledge::{KnowledgeChunk, RetrievedChunk};
use crate::domain::search::VectorSearchGateway;
use crate::domain::DomainError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorSearchGateway {
    chunks: Arc<Vec<KnowledgeChunk>>,
}

impl InMemoryVectorSearchGateway {
    pub fn new(chunks: Vec<KnowledgeChunk>) -> Self {
        Self {
            chunks: Arc::new(chunks),
        }
    }

    /// Parse a JSON array of chunks
    pub fn from_json_str(json: &str) -> Result<Self, DomainError> {
        let chunks: Vec<KnowledgeChunk> = serde_json::from_str(json)
            .map_err(|e| DomainError::configuration(format!("Invalid corpus file: {}", e)))?;

        Ok(Self::new(chunks))
    }

    /// Load a JSON corpus file written by the ingestion job
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read corpus file {}: {}",
                path.display(),
                e
            ))
        })?;

        let gateway = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            chunks = gateway.len(),
            "Loaded in-memory corpus"
        );

        Ok(gateway)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl VectorSearchGateway for InMemoryVectorSearchGateway {
    async fn search(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, DomainError> {
        let mut skipped = 0usize;

        let mut scored: Vec<(f32, &KnowledgeChunk)> = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                if chunk.embedding.len() != query_vector.len() {
                    skipped += 1;
                    return None;
                }
                let score = cosine_similarity(query_vector, &chunk.embedding);
                (score >= threshold).then_some((score, chunk))
            })
            .collect();

        if skipped > 0 {
            warn!(
                skipped,
                query_dimensions = query_vector.len(),
                "Skipped corpus chunks with mismatched embedding dimensions"
            );
        }

        // Stable sort keeps corpus order for equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(limit);

        debug!(
            matches = scored.len(),
            threshold,
            limit,
            "In-memory search completed"
        );

        Ok(scored
            .into_iter()
            .map(|(score, chunk)| RetrievedChunk::new(chunk.clone(), score))
            .collect())
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
