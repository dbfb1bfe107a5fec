//! Vector search gateway implementations

mod in_memory;
mod pgvector;

pub use in_memory::InMemoryVectorSearchGateway;
pub use pgvector::{PgvectorConfig, PgvectorSearchGateway};
