//! Grounded QA Gateway
//!
//! Answers questions from a curated knowledge corpus with numbered, verifiable
//! citations:
//! - Query expansion with a static synonym table
//! - Embedding and similarity search (in-memory or pgvector)
//! - Grounded prompts that forbid answers outside the retrieved passages
//! - Sync JSON answers and streamed server-sent events

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::retrieval::RetrievalOrchestrator;
use infrastructure::factory::CollaboratorFactory;
use infrastructure::services::AnswerService;

/// Wire the answer pipeline from configuration
pub async fn create_answer_service(config: &AppConfig) -> anyhow::Result<AnswerService> {
    config.validate()?;

    let embedder = CollaboratorFactory::embedding(&config.embedding)?;
    let gateway = CollaboratorFactory::vector_store(&config.vector_store).await?;
    let generation = CollaboratorFactory::generation(&config.generation)?;

    let policy = config.retrieval.policy();
    info!(
        threshold = policy.similarity_threshold,
        fallback = ?policy.fallback_threshold,
        match_count = policy.match_count,
        backend = gateway.backend_name(),
        "Retrieval configured"
    );

    let retrieval = RetrievalOrchestrator::new(embedder, gateway, policy);

    Ok(AnswerService::new(retrieval, generation)
        .with_limits(config.retrieval.limits())
        .with_stream_settings(config.stream_settings()))
}

/// Build the shared HTTP state from configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let service = create_answer_service(config).await?;

    Ok(AppState::new(Arc::new(service)).with_keep_alive(config.stream.keep_alive()))
}
