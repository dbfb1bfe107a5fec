//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod factory;
pub mod http_client;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod services;
pub mod vector_store;
