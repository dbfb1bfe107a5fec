//! Generation client domain models and traits

mod message;
mod provider;

pub use message::{Message, MessageRole, Prompt};
pub use provider::{FragmentStream, GenerationClient};

#[cfg(test)]
pub use provider::mock::MockGenerationClient;
