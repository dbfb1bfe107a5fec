//! Generation client implementations

mod openai;

pub use openai::{
    GenerationParams, OpenAiGenerationClient, DEFAULT_GENERATION_MODEL, DEFAULT_OPENAI_BASE_URL,
};
