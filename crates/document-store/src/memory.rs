use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentQuery, ExpectedVersion, Result, StoreError, store::DocumentStore,
};

#[derive(Default)]
struct Inner {
    documents: HashMap<(String, String), (u64, Document)>,
    next_seq: u64,
}

/// In-memory document store implementation.
///
/// Backs tests and the single-process deployment; provides the same
/// compare-and-swap guarantees as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents across all collections.
    pub async fn document_count(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Removes every document.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.documents.clear();
        inner.next_seq = 0;
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .map(|(_, doc)| doc.clone()))
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: serde_json::Value,
        expected: ExpectedVersion,
    ) -> Result<Document> {
        let key = (collection.to_string(), id.to_string());
        let mut inner = self.inner.write().await;

        let existing = inner
            .documents
            .get(&key)
            .map(|(seq, doc)| (*seq, doc.version, doc.created_at));
        let actual = existing.map(|(_, version, _)| version);
        if !expected.matches(actual) {
            return Err(StoreError::ConcurrencyConflict {
                collection: key.0,
                id: key.1,
                expected,
                actual,
            });
        }

        let now = Utc::now();
        let (seq, created_at) = match existing {
            Some((seq, _, created_at)) => (seq, created_at),
            None => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                (seq, now)
            }
        };

        let document = Document {
            collection: key.0.clone(),
            id: key.1.clone(),
            version: expected.next_version(),
            created_at,
            updated_at: now,
            body,
        };
        inner.documents.insert(key, (seq, document.clone()));
        Ok(document)
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<_> = inner
            .documents
            .iter()
            .filter(|((collection, _), (_, doc))| {
                *collection == query.collection && query.matches(&doc.body)
            })
            .map(|(_, (seq, doc))| (*seq, doc))
            .collect();
        matching.sort_by_key(|(seq, _)| *seq);

        Ok(matching
            .into_iter()
            .map(|(_, doc)| doc.clone())
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}
