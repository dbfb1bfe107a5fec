//! Request and response bodies for `POST /v1/answers`

use serde::{Deserialize, Serialize};

use crate::domain::query::{AnswerMode, Query, QueryLimits, SupplementaryDocument};
use crate::domain::{DomainError, Source};
use crate::infrastructure::services::GroundedAnswer;

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    #[serde(default)]
    pub mode: AnswerMode,
    #[serde(default)]
    pub supplementary_document: Option<SupplementaryDocumentBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplementaryDocumentBody {
    pub name: String,
    pub content: String,
}

impl AnswerRequest {
    /// Validate the body into a domain query for `caller_id`
    pub fn into_query(self, caller_id: &str, limits: &QueryLimits) -> Result<Query, DomainError> {
        let document = self
            .supplementary_document
            .map(|doc| SupplementaryDocument::new(doc.name, doc.content));

        Query::parse(&self.query, self.mode, document, caller_id, limits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl From<GroundedAnswer> for AnswerResponse {
    fn from(answer: GroundedAnswer) -> Self {
        Self {
            answer: answer.answer,
            sources: answer.sources,
        }
    }
}
