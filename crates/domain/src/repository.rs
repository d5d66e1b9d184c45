//! Versioned persistence for entities.

use std::marker::PhantomData;

use document_store::{DocumentQuery, DocumentStore, ExpectedVersion, StoreError};

use crate::entity::Entity;
use crate::error::DomainError;

/// How often a compare-and-swap update is retried before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy with the given number of attempts (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

/// Loads and saves one kind of entity.
///
/// Every mutation is a read-modify-write guarded by the document version:
/// 1. Load the document and its version
/// 2. Run the mutation against the decoded entity
/// 3. Write it back only if the version is unchanged
/// 4. On a lost race, reload and start over, up to `RetryPolicy::max_attempts`
///
/// A mutation that returns an error is never written.
pub struct Repository<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    store: S,
    retry: RetryPolicy,
    _phantom: PhantomData<E>,
}

impl<S, E> Clone for Repository<S, E>
where
    S: DocumentStore + Clone,
    E: Entity,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            retry: self.retry,
            _phantom: PhantomData,
        }
    }
}

impl<S, E> Repository<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    /// Creates a repository with the default retry policy.
    pub fn new(store: S) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    /// Creates a repository with a custom retry policy.
    pub fn with_retry(store: S, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn get(&self, id: &str) -> Result<Option<E>, DomainError> {
        match self.store.get(E::collection(), id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Loads an entity that must exist.
    pub async fn load(&self, id: &str) -> Result<E, DomainError> {
        self.get(id).await?.ok_or_else(|| DomainError::NotFound {
            entity: E::entity_name(),
            id: id.to_string(),
        })
    }

    /// Persists a new entity. Fails if one with the same id already exists.
    pub async fn insert(&self, entity: &E) -> Result<(), DomainError> {
        let body = serde_json::to_value(entity)?;
        self.store
            .put(
                E::collection(),
                &entity.document_id(),
                body,
                ExpectedVersion::Absent,
            )
            .await?;
        Ok(())
    }

    /// Applies `mutate` to an existing entity and saves the result.
    ///
    /// Returns the saved entity together with whatever `mutate` returned.
    pub async fn update<T, F>(&self, id: &str, mut mutate: F) -> Result<(E, T), DomainError>
    where
        F: FnMut(&mut E) -> Result<T, DomainError> + Send,
        T: Send,
    {
        for attempt in 1..=self.retry.max_attempts {
            let doc = self
                .store
                .get(E::collection(), id)
                .await?
                .ok_or_else(|| DomainError::NotFound {
                    entity: E::entity_name(),
                    id: id.to_string(),
                })?;

            let mut entity: E = doc.decode()?;
            let outcome = mutate(&mut entity)?;

            match self
                .write(id, &entity, ExpectedVersion::Exactly(doc.version))
                .await
            {
                Ok(()) => return Ok((entity, outcome)),
                Err(e) if e.is_conflict() => self.record_conflict(id, attempt),
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.exhausted(id))
    }

    /// Like `update`, but starts from `create()` when the entity doesn't
    /// exist yet.
    pub async fn update_or_create<T, C, F>(
        &self,
        id: &str,
        create: C,
        mut mutate: F,
    ) -> Result<(E, T), DomainError>
    where
        C: Fn() -> E + Send + Sync,
        F: FnMut(&mut E) -> Result<T, DomainError> + Send,
        T: Send,
    {
        for attempt in 1..=self.retry.max_attempts {
            let (mut entity, expected) = match self.store.get(E::collection(), id).await? {
                Some(doc) => (doc.decode()?, ExpectedVersion::Exactly(doc.version)),
                None => (create(), ExpectedVersion::Absent),
            };

            let outcome = mutate(&mut entity)?;

            match self.write(id, &entity, expected).await {
                Ok(()) => return Ok((entity, outcome)),
                Err(e) if e.is_conflict() => self.record_conflict(id, attempt),
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.exhausted(id))
    }

    /// Lists entities matching a query on this entity's collection.
    ///
    /// The query's collection is overridden with the entity's own.
    pub async fn find(&self, mut query: DocumentQuery) -> Result<Vec<E>, DomainError> {
        query.collection = E::collection().to_string();
        self.store
            .find(query)
            .await?
            .iter()
            .map(|doc| doc.decode().map_err(DomainError::from))
            .collect()
    }

    /// Starts a query over this entity's collection.
    pub fn query(&self) -> DocumentQuery {
        DocumentQuery::new(E::collection())
    }

    async fn write(
        &self,
        id: &str,
        entity: &E,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_value(entity)?;
        self.store.put(E::collection(), id, body, expected).await?;
        Ok(())
    }

    fn record_conflict(&self, id: &str, attempt: u32) {
        metrics::counter!("document_conflicts_total", "collection" => E::collection())
            .increment(1);
        tracing::debug!(
            collection = E::collection(),
            id,
            attempt,
            "version conflict, retrying"
        );
    }

    fn exhausted(&self, id: &str) -> DomainError {
        tracing::warn!(
            collection = E::collection(),
            id,
            attempts = self.retry.max_attempts,
            "giving up after repeated version conflicts"
        );
        DomainError::Conflict {
            entity: E::entity_name(),
            id: id.to_string(),
            attempts: self.retry.max_attempts,
        }
    }
}
