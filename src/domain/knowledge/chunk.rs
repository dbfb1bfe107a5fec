//! Indexed corpus passages and their query-time scored form

use serde::{Deserialize, Serialize};

/// Kind of document a chunk was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Statute,
    VideoTranscript,
    PolicyDocument,
    /// Document attached by the caller for a single request
    AdHoc,
}

impl SourceType {
    /// Display icon shown next to a citation
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Statute => "⚖️",
            Self::VideoTranscript => "🎥",
            Self::PolicyDocument => "📄",
            Self::AdHoc => "📎",
        }
    }
}

/// A stored, pre-embedded passage of corpus text
///
/// Created by the offline ingestion job and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub content: String,
    pub source_type: SourceType,
    pub source_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_section: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl KnowledgeChunk {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        source_type: SourceType,
        source_title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source_type,
            source_title: source_title.into(),
            source_url: None,
            source_section: None,
            embedding: Vec::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.source_section = Some(section.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// A chunk paired with its similarity to the current query
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    chunk: KnowledgeChunk,
    similarity: f32,
}

impl RetrievedChunk {
    /// Wrap a chunk with a raw similarity score, clamped into [0, 1]
    pub fn new(chunk: KnowledgeChunk, similarity: f32) -> Self {
        let similarity = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };

        Self { chunk, similarity }
    }

    pub fn chunk(&self) -> &KnowledgeChunk {
        &self.chunk
    }

    pub fn into_chunk(self) -> KnowledgeChunk {
        self.chunk
    }

    pub fn similarity(&self) -> f32 {
        self.similarity
    }
}
