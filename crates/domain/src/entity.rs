//! Core entity trait.

use serde::{Serialize, de::DeserializeOwned};

/// An entity owned by exactly one component and persisted as one document.
///
/// All changes to an entity go through a single document write, so each
/// mutation is atomic with respect to other writers.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the entity's documents live in.
    fn collection() -> &'static str;

    /// Human-readable name used in error messages.
    fn entity_name() -> &'static str;

    /// Document identifier of this instance.
    fn document_id(&self) -> String;
}
