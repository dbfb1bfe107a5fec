//! Vector search domain traits

mod gateway;

pub use gateway::VectorSearchGateway;

#[cfg(test)]
pub use gateway::MockVectorSearchGateway;
