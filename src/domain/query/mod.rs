//! Caller questions - validation and retrieval-only expansion

mod expansion;
mod input;

pub use expansion::{expand, expand_with, SYNONYMS};
pub use input::{
    AnswerMode, Query, QueryLimits, SupplementaryDocument, DEFAULT_MAX_QUERY_CHARS,
};
