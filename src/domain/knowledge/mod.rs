//! Knowledge corpus domain - chunks, scored candidates and citations

mod chunk;
mod source;

pub use chunk::{KnowledgeChunk, RetrievedChunk, SourceType};
pub use source::Source;
