//! pgvector-backed vector search gateway

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, error, warn};

use crate::domain::knowledge::{KnowledgeChunk, RetrievedChunk, SourceType};
use crate::domain::search::VectorSearchGateway;
use crate::domain::DomainError;

/// Connection and table settings for the pgvector corpus
#[derive(Debug, Clone)]
pub struct PgvectorConfig {
    pub url: String,
    pub table_name: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgvectorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            table_name: "knowledge_chunks".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Similarity search against a `vector` column using cosine distance
///
/// Expected columns: `id`, `content`, `source_type`, `source_title`,
/// `source_url`, `source_section`, `embedding vector(d)`.
pub struct PgvectorSearchGateway {
    pool: PgPool,
    search_sql: String,
}

impl Debug for PgvectorSearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgvectorSearchGateway")
            .field("search_sql", &self.search_sql)
            .finish()
    }
}

impl PgvectorSearchGateway {
    pub fn new(pool: PgPool, table_name: &str) -> Result<Self, DomainError> {
        validate_table_name(table_name)?;

        Ok(Self {
            pool,
            search_sql: search_sql(table_name),
        })
    }

    /// Open a connection pool and verify it with a round trip
    pub async fn connect(config: &PgvectorConfig) -> Result<Self, DomainError> {
        validate_table_name(&config.table_name)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| {
                DomainError::configuration(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        Self::new(pool, &config.table_name)
    }
}

#[async_trait]
impl VectorSearchGateway for PgvectorSearchGateway {
    async fn search(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, DomainError> {
        let rows = sqlx::query(&self.search_sql)
            .bind(vector_literal(query_vector))
            .bind(f64::from(threshold))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "pgvector search failed");
                DomainError::provider("pgvector", format!("Search failed: {}", e))
            })?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            match chunk_from_row(row) {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "Skipping unreadable corpus row"),
            }
        }

        debug!(
            rows = rows.len(),
            results = results.len(),
            threshold,
            limit,
            "pgvector search completed"
        );

        Ok(results)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| DomainError::provider("pgvector", format!("Health check failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "pgvector"
    }
}

fn search_sql(table: &str) -> String {
    format!(
        r#"
        SELECT
            id::text AS id,
            content,
            source_type,
            source_title,
            source_url,
            source_section,
            1 - (embedding <=> $1::vector) AS similarity
        FROM {table}
        WHERE 1 - (embedding <=> $1::vector) >= $2
        ORDER BY embedding <=> $1::vector, id
        LIMIT $3
        "#
    )
}

fn chunk_from_row(row: &PgRow) -> Result<RetrievedChunk, DomainError> {
    let read = |e: sqlx::Error| DomainError::provider("pgvector", e.to_string());

    let source_type: String = row.try_get("source_type").map_err(read)?;
    let source_type = parse_source_type(&source_type).ok_or_else(|| {
        DomainError::provider("pgvector", format!("Unknown source type '{}'", source_type))
    })?;

    let chunk = KnowledgeChunk {
        id: row.try_get("id").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
        source_type,
        source_title: row.try_get("source_title").map_err(read)?,
        source_url: row.try_get("source_url").map_err(read)?,
        source_section: row.try_get("source_section").map_err(read)?,
        embedding: Vec::new(),
    };
    let similarity: f64 = row.try_get("similarity").map_err(read)?;

    Ok(RetrievedChunk::new(chunk, similarity as f32))
}

fn parse_source_type(value: &str) -> Option<SourceType> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "statute" => Some(SourceType::Statute),
        "video_transcript" | "video" => Some(SourceType::VideoTranscript),
        "policy_document" | "policy" => Some(SourceType::PolicyDocument),
        "ad_hoc" => Some(SourceType::AdHoc),
        _ => None,
    }
}

/// Text form accepted by the `::vector` cast
fn vector_literal(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

fn validate_table_name(name: &str) -> Result<(), DomainError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid vector table name '{}'",
            name
        )))
    }
}
