//! Retrieval tuning knobs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Threshold, count and budget settings for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalPolicy {
    /// Minimum similarity for a chunk to count as relevant
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Maximum number of chunks requested from the search gateway
    #[serde(default = "default_match_count")]
    pub match_count: usize,
    /// Lower threshold tried once when the first search finds nothing
    #[serde(default)]
    pub fallback_threshold: Option<f32>,
    /// Per-chunk character budget in the grounding context
    #[serde(default = "default_max_chars_per_chunk")]
    pub max_chars_per_chunk: usize,
    /// Bound on each embedding and search call
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
}

fn default_similarity_threshold() -> f32 {
    0.30
}

fn default_match_count() -> usize {
    5
}

fn default_max_chars_per_chunk() -> usize {
    2000
}

fn default_collaborator_timeout_ms() -> u64 {
    10_000
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            match_count: default_match_count(),
            fallback_threshold: None,
            max_chars_per_chunk: default_max_chars_per_chunk(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
        }
    }
}

impl RetrievalPolicy {
    pub fn with_fallback_threshold(mut self, threshold: f32) -> Self {
        self.fallback_threshold = Some(threshold);
        self
    }

    pub fn with_match_count(mut self, count: usize) -> Self {
        self.match_count = count;
        self
    }

    pub fn with_max_chars_per_chunk(mut self, max_chars: usize) -> Self {
        self.max_chars_per_chunk = max_chars;
        self
    }

    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Reject settings that would make retrieval meaningless
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::configuration(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.match_count == 0 {
            return Err(DomainError::configuration("match_count must be at least 1"));
        }

        if let Some(fallback) = self.fallback_threshold {
            if !(-1.0..=1.0).contains(&fallback) || fallback >= self.similarity_threshold {
                return Err(DomainError::configuration(format!(
                    "fallback_threshold must be within [-1, 1] and below {}, got {}",
                    self.similarity_threshold, fallback
                )));
            }
        }

        if self.max_chars_per_chunk == 0 {
            return Err(DomainError::configuration(
                "max_chars_per_chunk must be at least 1",
            ));
        }

        if self.collaborator_timeout_ms == 0 {
            return Err(DomainError::configuration(
                "collaborator_timeout_ms must be at least 1",
            ));
        }

        Ok(())
    }
}
