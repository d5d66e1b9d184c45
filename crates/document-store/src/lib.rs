//! Versioned document persistence.
//!
//! Every entity is stored as a JSON document inside a named collection. Each
//! write carries the version the writer last saw, and the store rejects the
//! write when somebody else got there first. Callers reload and retry.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::{Document, ExpectedVersion, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::DocumentQuery;
pub use store::DocumentStore;
