//! Domain layer - Core business logic and entities

pub mod embedding;
pub mod error;
pub mod grounding;
pub mod knowledge;
pub mod llm;
pub mod query;
pub mod retrieval;
pub mod search;
pub mod stream;

pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use error::{DomainError, RetrievalStage};
pub use grounding::GroundedPromptBuilder;
pub use knowledge::{KnowledgeChunk, RetrievedChunk, Source, SourceType};
pub use llm::{FragmentStream, GenerationClient, Message, MessageRole, Prompt};
pub use query::{expand, AnswerMode, Query, QueryLimits, SupplementaryDocument};
pub use retrieval::{RetrievalOrchestrator, RetrievalOutcome, RetrievalPolicy, NO_RELEVANT_CONTEXT};
pub use search::VectorSearchGateway;
pub use stream::{
    spawn_answer_stream, AnswerStream, StreamEvent, StreamOutcome, StreamSettings, StreamState,
    StreamSummary, StreamTransport,
};
