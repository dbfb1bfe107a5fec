//! Validated caller questions

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Default upper bound on question length, in characters
pub const DEFAULT_MAX_QUERY_CHARS: usize = 2000;

/// How the answer is delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Sync,
    Streaming,
}

/// A document the caller attached to a single question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplementaryDocument {
    pub name: String,
    pub content: String,
}

impl SupplementaryDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Length limits applied before a question reaches retrieval
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub max_query_chars: usize,
    pub max_document_chars: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
            max_document_chars: 50_000,
        }
    }
}

/// A caller question that passed validation
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    mode: AnswerMode,
    supplementary_document: Option<SupplementaryDocument>,
    caller_id: String,
}

impl Query {
    /// Validate raw caller input
    ///
    /// The text is trimmed and must be 1..=`max_query_chars` characters.
    /// Supplementary documents are only accepted in streaming mode.
    pub fn parse(
        raw: &str,
        mode: AnswerMode,
        supplementary_document: Option<SupplementaryDocument>,
        caller_id: impl Into<String>,
        limits: &QueryLimits,
    ) -> Result<Self, DomainError> {
        let text = raw.trim();

        if text.is_empty() {
            return Err(DomainError::input_invalid("Query cannot be empty"));
        }

        let length = text.chars().count();
        if length > limits.max_query_chars {
            return Err(DomainError::input_invalid(format!(
                "Query is {} characters, maximum is {}",
                length, limits.max_query_chars
            )));
        }

        let supplementary_document = supplementary_document
            .map(|doc| validate_document(doc, mode, limits))
            .transpose()?;

        Ok(Self {
            text: text.to_string(),
            mode,
            supplementary_document,
            caller_id: caller_id.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    pub fn supplementary_document(&self) -> Option<&SupplementaryDocument> {
        self.supplementary_document.as_ref()
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }
}

fn validate_document(
    doc: SupplementaryDocument,
    mode: AnswerMode,
    limits: &QueryLimits,
) -> Result<SupplementaryDocument, DomainError> {
    if mode != AnswerMode::Streaming {
        return Err(DomainError::input_invalid(
            "Supplementary documents are only supported in streaming mode",
        ));
    }

    let name = doc.name.trim();
    if name.is_empty() {
        return Err(DomainError::input_invalid(
            "Supplementary document name cannot be empty",
        ));
    }

    if doc.content.trim().is_empty() {
        return Err(DomainError::input_invalid(
            "Supplementary document content cannot be empty",
        ));
    }

    let length = doc.content.chars().count();
    if length > limits.max_document_chars {
        return Err(DomainError::input_invalid(format!(
            "Supplementary document is {} characters, maximum is {}",
            length, limits.max_document_chars
        )));
    }

    Ok(SupplementaryDocument::new(name, doc.content))
}
