//! User-facing citation units

use serde::{Deserialize, Serialize};

use super::chunk::{KnowledgeChunk, SourceType};

/// A de-duplicated citation shown alongside an answer
///
/// `ordinal` is the number the answer uses in `[n]` markers. Within one
/// response ordinals run 1..=N without gaps and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub ordinal: usize,
    pub icon: String,
    pub source_type: SourceType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    /// Build the citation for a chunk at the given ordinal
    pub fn from_chunk(chunk: &KnowledgeChunk, ordinal: usize) -> Self {
        Self {
            id: chunk.id.clone(),
            ordinal,
            icon: chunk.source_type.icon().to_string(),
            source_type: chunk.source_type,
            title: chunk.source_title.clone(),
            section: chunk.source_section.clone(),
            url: chunk.source_url.clone(),
        }
    }

    /// Marker the generated answer uses to cite this source
    pub fn marker(&self) -> String {
        format!("[{}]", self.ordinal)
    }
}
