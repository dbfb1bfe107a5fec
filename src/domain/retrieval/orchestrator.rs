//! Expansion, embedding, search and assembly for one question

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use super::assembly::{assemble, supplementary_chunk, RetrievalOutcome};
use super::policy::RetrievalPolicy;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::error::RetrievalStage;
use crate::domain::knowledge::RetrievedChunk;
use crate::domain::query::{expand, SupplementaryDocument};
use crate::domain::search::VectorSearchGateway;
use crate::domain::DomainError;

/// Runs the retrieval half of the answer pipeline
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    gateway: Arc<dyn VectorSearchGateway>,
    policy: RetrievalPolicy,
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("embedder", &self.embedder.provider_name())
            .field("gateway", &self.gateway.backend_name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<dyn VectorSearchGateway>,
        policy: RetrievalPolicy,
    ) -> Self {
        Self {
            embedder,
            gateway,
            policy,
        }
    }

    pub fn policy(&self) -> &RetrievalPolicy {
        &self.policy
    }

    pub fn gateway(&self) -> &Arc<dyn VectorSearchGateway> {
        &self.gateway
    }

    /// Retrieve citations and grounding text for a question
    ///
    /// Embedding and search failures (including timeouts) surface as
    /// `RetrievalUnavailable`. Finding nothing is not an error.
    pub async fn retrieve(
        &self,
        query: &str,
        supplementary_document: Option<&SupplementaryDocument>,
    ) -> Result<RetrievalOutcome, DomainError> {
        let vector = self.embed_query(query).await?;

        let mut candidates = self
            .search_at(&vector, self.policy.similarity_threshold)
            .await?;
        let mut fallback_used = false;

        if candidates.is_empty() {
            if let Some(fallback) = self.policy.fallback_threshold {
                debug!(
                    threshold = self.policy.similarity_threshold,
                    fallback_threshold = fallback,
                    "No matches at configured threshold, widening once"
                );
                candidates = self.search_at(&vector, fallback).await?;
                fallback_used = !candidates.is_empty();
            }
        }

        if let Some(document) = supplementary_document {
            candidates.insert(0, supplementary_chunk(document));
        }

        let mut outcome = assemble(candidates, self.policy.max_chars_per_chunk);
        outcome.fallback_used = fallback_used;

        info!(
            candidates = outcome.candidate_count,
            sources = outcome.sources.len(),
            fallback_used,
            has_supplementary_document = supplementary_document.is_some(),
            "Retrieval completed"
        );

        Ok(outcome)
    }

    /// Embed the expanded form of a question
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let expanded = expand(query);
        debug!(expanded_query = %expanded, "Expanded query for retrieval");

        let vector = bounded(
            RetrievalStage::Embedding,
            self.policy.collaborator_timeout(),
            self.embedder.embed(&expanded),
        )
        .await?;

        if vector.is_empty() {
            return Err(DomainError::retrieval_unavailable(
                RetrievalStage::Embedding,
                "embedding provider returned an empty vector",
            ));
        }

        Ok(vector)
    }

    /// Run one bounded search at an explicit threshold
    pub async fn search_at(
        &self,
        vector: &[f32],
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, DomainError> {
        bounded(
            RetrievalStage::Search,
            self.policy.collaborator_timeout(),
            self.gateway.search(vector, threshold, self.policy.match_count),
        )
        .await
    }
}

async fn bounded<T>(
    stage: RetrievalStage,
    limit: Duration,
    future: impl Future<Output = Result<T, DomainError>>,
) -> Result<T, DomainError> {
    match timeout(limit, future).await {
        Ok(result) => result.map_err(|e| e.into_retrieval(stage)),
        Err(_) => Err(DomainError::retrieval_unavailable(
            stage,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::knowledge::{KnowledgeChunk, SourceType};
    use crate::domain::retrieval::NO_RELEVANT_CONTEXT;
    use crate::domain::search::MockVectorSearchGateway;

    fn tenancy_chunk() -> RetrievedChunk {
        RetrievedChunk::new(
            KnowledgeChunk::new(
                "statute-90-427-a",
                "A month-to-month tenancy may be terminated by written notice...",
                SourceType::Statute,
                "Termination of periodic tenancy",
            )
            .with_section("90.427"),
            0.81,
        )
    }

    fn orchestrator(gateway: MockVectorSearchGateway, policy: RetrievalPolicy) -> RetrievalOrchestrator {
        RetrievalOrchestrator::new(
            Arc::new(MockEmbeddingProvider::new(8)),
            Arc::new(gateway),
            policy,
        )
    }

    #[tokio::test]
    async fn test_retrieve_single_statute() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_search()
            .withf(|_, threshold, limit| *threshold == 0.30 && *limit == 5)
            .times(1)
            .returning(|_, _, _| Ok(vec![tenancy_chunk()]));

        let outcome = orchestrator(gateway, RetrievalPolicy::default())
            .retrieve("What notice is required before ending a month-to-month tenancy?", None)
            .await
            .unwrap();

        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].ordinal, 1);
        assert_eq!(outcome.sources[0].title, "Termination of periodic tenancy");
        assert_eq!(outcome.sources[0].section.as_deref(), Some("90.427"));
        assert!(!outcome.fallback_used);
    }

    #[tokio::test]
    async fn test_expanded_query_is_embedded() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let mut gateway = MockVectorSearchGateway::new();
        gateway.expect_search().returning(|_, _, _| Ok(vec![]));

        let orchestrator = RetrievalOrchestrator::new(
            embedder.clone(),
            Arc::new(gateway),
            RetrievalPolicy::default(),
        );
        orchestrator.retrieve("Can they evict me?", None).await.unwrap();

        let calls = embedder.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("Can they evict me? "));
        assert!(calls[0].contains("forcible entry and detainer"));
    }

    #[tokio::test]
    async fn test_no_matches_without_fallback_searches_once() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_search()
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let outcome = orchestrator(gateway, RetrievalPolicy::default())
            .retrieve("What is the airspeed of a swallow?", None)
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.grounding_context, NO_RELEVANT_CONTEXT);
    }

    #[tokio::test]
    async fn test_fallback_threshold_tried_once() {
        let mut gateway = MockVectorSearchGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_search()
            .withf(|_, threshold, _| *threshold == 0.30)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(vec![]));
        gateway
            .expect_search()
            .withf(|_, threshold, _| *threshold == 0.15)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(vec![tenancy_chunk()]));

        let policy = RetrievalPolicy::default().with_fallback_threshold(0.15);
        let outcome = orchestrator(gateway, policy)
            .retrieve("ending my lease", None)
            .await
            .unwrap();

        assert_eq!(outcome.sources.len(), 1);
        assert!(outcome.fallback_used);
    }

    #[tokio::test]
    async fn test_fallback_not_used_when_first_search_matches() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_search()
            .withf(|_, threshold, _| *threshold == 0.30)
            .times(1)
            .returning(|_, _, _| Ok(vec![tenancy_chunk()]));

        let policy = RetrievalPolicy::default().with_fallback_threshold(0.15);
        let outcome = orchestrator(gateway, policy)
            .retrieve("ending my lease", None)
            .await
            .unwrap();

        assert!(!outcome.fallback_used);
    }

    #[tokio::test]
    async fn test_supplementary_document_takes_ordinal_one() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_search()
            .returning(|_, _, _| Ok(vec![tenancy_chunk()]));

        let doc = SupplementaryDocument::new("my-lease.pdf", "Either party may end this lease with 30 days notice.");
        let outcome = orchestrator(gateway, RetrievalPolicy::default())
            .retrieve("How much notice do I need to give?", Some(&doc))
            .await
            .unwrap();

        assert_eq!(outcome.sources.len(), 2);
        assert_eq!(outcome.sources[0].ordinal, 1);
        assert_eq!(outcome.sources[0].title, "my-lease.pdf");
        assert_eq!(outcome.sources[1].ordinal, 2);
        assert!(outcome.grounding_context.starts_with("[1] my-lease.pdf\n"));
    }

    #[tokio::test]
    async fn test_supplementary_document_with_no_corpus_matches() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway.expect_search().returning(|_, _, _| Ok(vec![]));

        let doc = SupplementaryDocument::new("notice.txt", "You must vacate by Friday.");
        let outcome = orchestrator(gateway, RetrievalPolicy::default())
            .retrieve("Is this notice valid?", Some(&doc))
            .await
            .unwrap();

        assert_eq!(outcome.sources.len(), 1);
        assert_ne!(outcome.grounding_context, NO_RELEVANT_CONTEXT);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_retrieval_unavailable() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway.expect_search().never();

        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(MockEmbeddingProvider::new(8).with_error("rate limited")),
            Arc::new(gateway),
            RetrievalPolicy::default(),
        );

        let result = orchestrator.retrieve("question", None).await;

        assert!(matches!(
            result,
            Err(DomainError::RetrievalUnavailable {
                stage: RetrievalStage::Embedding,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_search_failure_is_retrieval_unavailable() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway
            .expect_search()
            .returning(|_, _, _| Err(DomainError::provider("pgvector", "connection refused")));

        let result = orchestrator(gateway, RetrievalPolicy::default())
            .retrieve("question", None)
            .await;

        assert!(matches!(
            result,
            Err(DomainError::RetrievalUnavailable {
                stage: RetrievalStage::Search,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_embedding_timeout_is_retrieval_unavailable() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway.expect_search().never();

        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(MockEmbeddingProvider::new(8).with_delay(Duration::from_millis(200))),
            Arc::new(gateway),
            RetrievalPolicy::default().with_collaborator_timeout(Duration::from_millis(20)),
        );

        let result = orchestrator.retrieve("question", None).await;

        match result {
            Err(DomainError::RetrievalUnavailable { stage, message }) => {
                assert_eq!(stage, RetrievalStage::Embedding);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retrieval_is_idempotent() {
        let mut gateway = MockVectorSearchGateway::new();
        gateway.expect_search().times(2).returning(|_, _, _| {
            Ok(vec![
                tenancy_chunk(),
                RetrievedChunk::new(
                    KnowledgeChunk::new("v1", "transcript", SourceType::VideoTranscript, "Ending a tenancy"),
                    0.6,
                ),
            ])
        });

        let orchestrator = orchestrator(gateway, RetrievalPolicy::default());
        let first = orchestrator.retrieve("ending a tenancy", None).await.unwrap();
        let second = orchestrator.retrieve("ending a tenancy", None).await.unwrap();

        assert_eq!(first.sources, second.sources);
        assert_eq!(first.grounding_context, second.grounding_context);
    }
}
