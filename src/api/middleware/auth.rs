//! Caller identity extractor
//!
//! Credentials are verified upstream; here the identity only has to be
//! present so every question can be attributed in the audit log. Bearer
//! tokens never become the identity themselves, only a fingerprint of them.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::api::types::ApiError;

pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// Hex characters of the token digest kept in the audit identity
const FINGERPRINT_LEN: usize = 16;

/// Extractor that requires an identified caller
///
/// Reads the identity from either:
/// - X-Caller-Id header: `<caller id>`
/// - Authorization header: `Bearer <token>`, recorded as `bearer:<fingerprint>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireCaller(pub String);

impl<S> FromRequestParts<S> for RequireCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = extract_caller(&parts.headers)?;
        debug!(caller = %caller, "Caller identified");
        Ok(RequireCaller(caller))
    }
}

fn extract_caller(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(value) = headers.get(CALLER_ID_HEADER) {
        let caller = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-Caller-Id header encoding"))?
            .trim();

        if !caller.is_empty() {
            return Ok(caller.to_string());
        }
    }

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let auth = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(bearer_identity(token));
            }
        }
    }

    Err(ApiError::unauthorized(
        "Caller identity required. Provide 'X-Caller-Id: <id>' or 'Authorization: Bearer <token>'",
    ))
}

fn bearer_identity(token: &str) -> String {
    let digest = hex::encode(Sha256::digest(token.as_bytes()));
    format!("bearer:{}", &digest[..FINGERPRINT_LEN])
}
