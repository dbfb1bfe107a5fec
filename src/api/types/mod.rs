//! HTTP request, response and error types

pub mod answer;
pub mod error;
pub mod json;

pub use answer::{AnswerRequest, AnswerResponse, SupplementaryDocumentBody};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
