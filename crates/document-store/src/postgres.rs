use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, DocumentQuery, ExpectedVersion, Result, StoreError, Version, store::DocumentStore,
};

const COLUMNS: &str = "collection, id, version, created_at, updated_at, body";

/// PostgreSQL-backed document store implementation.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, id)`; bodies are `jsonb` so listing filters run as
/// containment queries.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            id: row.try_get("id")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    async fn current_version(&self, collection: &str, id: &str) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version.map(Version::new))
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: serde_json::Value,
        expected: ExpectedVersion,
    ) -> Result<Document> {
        // Both statements check and write in one round trip; zero rows back
        // means the precondition failed.
        let row = match expected {
            ExpectedVersion::Absent => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO documents (collection, id, version, body)
                    VALUES ($1, $2, 1, $3)
                    ON CONFLICT (collection, id) DO NOTHING
                    RETURNING {COLUMNS}
                    "#
                ))
                .bind(collection)
                .bind(id)
                .bind(&body)
                .fetch_optional(&self.pool)
                .await?
            }
            ExpectedVersion::Exactly(version) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE documents
                    SET version = version + 1, updated_at = NOW(), body = $3
                    WHERE collection = $1 AND id = $2 AND version = $4
                    RETURNING {COLUMNS}
                    "#
                ))
                .bind(collection)
                .bind(id)
                .bind(&body)
                .bind(version.as_i64())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match row {
            Some(row) => Self::row_to_document(row),
            None => Err(StoreError::ConcurrencyConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected,
                actual: self.current_version(collection, id).await?,
            }),
        }
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let filter = serde_json::Value::Object(query.filter);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET COALESCE($4, 0)
            "#
        ))
        .bind(&query.collection)
        .bind(filter)
        .bind(query.limit.map(|l| l as i64))
        .bind(query.offset.map(|o| o as i64))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }
}
