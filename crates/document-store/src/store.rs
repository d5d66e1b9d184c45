use async_trait::async_trait;

use crate::{Document, DocumentQuery, ExpectedVersion, Result};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). A `put` is atomic:
/// the precondition check and the write happen as one step, so of two writers
/// holding the same version exactly one succeeds.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a document. Returns None if it doesn't exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Writes a document if `expected` holds.
    ///
    /// Fails with `ConcurrencyConflict` otherwise. Returns the stored
    /// document with its new version.
    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: serde_json::Value,
        expected: ExpectedVersion,
    ) -> Result<Document>;

    /// Lists documents matching a query.
    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        (**self).get(collection, id).await
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: serde_json::Value,
        expected: ExpectedVersion,
    ) -> Result<Document> {
        (**self).put(collection, id, body, expected).await
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        (**self).find(query).await
    }
}
