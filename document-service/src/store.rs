use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use crate::models::SearchHit;

/// pgvector-backed storage for chunk embeddings.
///
/// Expects a table of the form:
///
/// ```sql
/// CREATE TABLE document_chunks (
///     id UUID PRIMARY KEY,
///     document_id UUID NOT NULL,
///     content TEXT NOT NULL,
///     embedding vector(384) NOT NULL
/// );
/// ```
pub struct VectorStore {
    pool: sqlx::PgPool,
}

impl VectorStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Insert one embedded chunk row.
    pub async fn store_chunk(
        &self,
        document_id: Uuid,
        content: &str,
        embedding: &[f32],
    ) -> anyhow::Result<()> {
        let sql = format!(
            "INSERT INTO document_chunks (id, document_id, content, embedding) \
             VALUES ($1, $2, $3, ARRAY[{}]::vector)",
            vector_literal(embedding)
        );
        sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Nearest-neighbor search over stored chunks.
    pub async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let sql = format!(
            "SELECT content, (embedding <-> ARRAY[{}]::vector)::float8 AS distance \
             FROM document_chunks \
             ORDER BY distance \
             LIMIT {}",
            vector_literal(embedding),
            top_k
        );
        let hits = sqlx::query_as::<_, SearchHit>(&sql)
            .fetch_all(&self.pool)
            .await?;

        info!("Retrieved {} results from vector search", hits.len());

        Ok(hits)
    }
}

// Build a literal vector representation suitable for pgvector.
fn vector_literal(embedding: &[f32]) -> String {
    embedding
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[1.0, -0.5, 0.25]), "1,-0.5,0.25");
        assert_eq!(vector_literal(&[]), "");
    }
}
