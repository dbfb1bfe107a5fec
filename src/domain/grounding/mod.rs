//! Grounded prompt construction

mod builder;

pub use builder::GroundedPromptBuilder;
