//! Retrieval orchestration - search, fallback, de-duplication and citation numbering

mod assembly;
mod orchestrator;
mod policy;

pub use assembly::{
    assemble, supplementary_chunk, truncate_chars, RetrievalOutcome, NO_RELEVANT_CONTEXT,
    SUPPLEMENTARY_SIMILARITY,
};
pub use orchestrator::RetrievalOrchestrator;
pub use policy::RetrievalPolicy;
