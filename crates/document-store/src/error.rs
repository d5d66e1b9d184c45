use thiserror::Error;

use crate::{ExpectedVersion, Version};

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version did not match the version the writer expected.
    #[error(
        "Concurrency conflict on {collection}/{id}: expected {expected}, found {}",
        actual.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    )]
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: ExpectedVersion,
        actual: Option<Version>,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for a lost compare-and-swap race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
