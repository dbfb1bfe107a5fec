use thiserror::Error;

/// Pipeline stage that failed while retrieving context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Embedding,
    Search,
}

impl std::fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedding => write!(f, "embedding"),
            Self::Search => write!(f, "vector search"),
        }
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {message}")]
    InputInvalid { message: String },

    #[error("Retrieval unavailable ({stage}): {message}")]
    RetrievalUnavailable {
        stage: RetrievalStage,
        message: String,
    },

    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn input_invalid(message: impl Into<String>) -> Self {
        Self::InputInvalid {
            message: message.into(),
        }
    }

    pub fn retrieval_unavailable(stage: RetrievalStage, message: impl Into<String>) -> Self {
        Self::RetrievalUnavailable {
            stage,
            message: message.into(),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Re-tag a collaborator failure as a retrieval failure at the given stage
    pub fn into_retrieval(self, stage: RetrievalStage) -> Self {
        match self {
            Self::RetrievalUnavailable { .. } => self,
            other => Self::retrieval_unavailable(stage, other.to_string()),
        }
    }

    /// Re-tag a collaborator failure as a generation failure
    pub fn into_generation(self) -> Self {
        match self {
            Self::GenerationFailed { .. } => self,
            other => Self::generation_failed(other.to_string()),
        }
    }
}
