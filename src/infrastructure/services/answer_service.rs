//! Answer service - runs the grounded answer pipeline in sync or streaming mode

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::domain::query::{AnswerMode, Query, QueryLimits};
use crate::domain::retrieval::{RetrievalOrchestrator, RetrievalOutcome};
use crate::domain::stream::{spawn_answer_stream, StreamEvent, StreamSettings};
use crate::domain::{DomainError, GenerationClient, GroundedPromptBuilder, Source};
use crate::infrastructure::observability::{
    record_answer, record_retrieval, record_stream_fragments,
};

/// Complete answer returned by the sync mode
#[derive(Debug, Clone, Serialize)]
pub struct GroundedAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

pub struct AnswerService {
    retrieval: RetrievalOrchestrator,
    generation: Arc<dyn GenerationClient>,
    prompts: GroundedPromptBuilder,
    limits: QueryLimits,
    stream_settings: StreamSettings,
}

impl std::fmt::Debug for AnswerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerService")
            .field("retrieval", &self.retrieval)
            .field("generation", &self.generation.provider_name())
            .field("limits", &self.limits)
            .finish()
    }
}

impl AnswerService {
    pub fn new(retrieval: RetrievalOrchestrator, generation: Arc<dyn GenerationClient>) -> Self {
        Self {
            retrieval,
            generation,
            prompts: GroundedPromptBuilder::new(),
            limits: QueryLimits::default(),
            stream_settings: StreamSettings::default(),
        }
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_stream_settings(mut self, settings: StreamSettings) -> Self {
        self.stream_settings = settings;
        self
    }

    /// Bounds applied when parsing incoming questions
    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    pub fn retrieval(&self) -> &RetrievalOrchestrator {
        &self.retrieval
    }

    /// Answer a question and wait for the full text
    pub async fn answer(&self, query: &Query) -> Result<GroundedAnswer, DomainError> {
        let started = Instant::now();
        audit(query);

        let outcome = match self.retrieve(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                record_answer("sync", "retrieval_failed", started.elapsed());
                return Err(e);
            }
        };

        let prompt = self.prompts.build(query.text(), &outcome.grounding_context);

        match self.generation.generate(&prompt).await {
            Ok(answer) => {
                record_answer("sync", "completed", started.elapsed());
                Ok(GroundedAnswer {
                    answer,
                    sources: outcome.sources,
                })
            }
            Err(e) => {
                warn!(error = %e, caller = %query.caller_id(), "Generation failed");
                record_answer("sync", "generation_failed", started.elapsed());
                Err(e.into_generation())
            }
        }
    }

    /// Start a streamed answer
    ///
    /// Retrieval completes before this returns, so its failures are ordinary
    /// errors. Everything after the sources event is reported in-band.
    pub async fn answer_stream(
        &self,
        query: &Query,
    ) -> Result<ReceiverStream<StreamEvent>, DomainError> {
        let started = Instant::now();
        audit(query);

        let outcome = match self.retrieve(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                record_answer("streaming", "retrieval_failed", started.elapsed());
                return Err(e);
            }
        };

        let prompt = self.prompts.build(query.text(), &outcome.grounding_context);
        let stream = spawn_answer_stream(
            self.generation.clone(),
            prompt,
            outcome.sources,
            self.stream_settings.clone(),
        );

        let caller = query.caller_id().to_string();
        let summary = stream.summary;
        tokio::spawn(async move {
            match summary.await {
                Ok(summary) => {
                    record_stream_fragments(summary.fragments);
                    record_answer("streaming", summary.outcome.as_str(), started.elapsed());
                    info!(
                        caller = %caller,
                        outcome = summary.outcome.as_str(),
                        fragments = summary.fragments,
                        "Streamed answer finished"
                    );
                }
                Err(e) => warn!(error = %e, "Answer stream task aborted"),
            }
        });

        Ok(stream.events)
    }

    async fn retrieve(&self, query: &Query) -> Result<RetrievalOutcome, DomainError> {
        let outcome = self
            .retrieval
            .retrieve(query.text(), query.supplementary_document())
            .await
            .inspect_err(|e| warn!(error = %e, caller = %query.caller_id(), "Retrieval failed"))?;

        record_retrieval(outcome.sources.len(), outcome.fallback_used);
        Ok(outcome)
    }
}

fn audit(query: &Query) {
    let mode = match query.mode() {
        AnswerMode::Sync => "sync",
        AnswerMode::Streaming => "streaming",
    };

    info!(
        caller = %query.caller_id(),
        mode,
        query_chars = query.text().chars().count(),
        has_supplementary_document = query.supplementary_document().is_some(),
        "Answering question"
    );
    debug!(query = %query.text(), "Question text");
}
