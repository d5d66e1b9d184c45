use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of a stored document, used for optimistic concurrency control.
///
/// A document is written at version 1 and every successful update bumps the
/// version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a freshly inserted document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The document must not exist yet.
    Absent,
    /// The document must currently be at exactly this version.
    Exactly(Version),
}

impl ExpectedVersion {
    /// Returns the version the document will have after a successful write.
    pub fn next_version(&self) -> Version {
        match self {
            ExpectedVersion::Absent => Version::first(),
            ExpectedVersion::Exactly(v) => v.next(),
        }
    }

    /// Checks the precondition against the currently stored version.
    pub fn matches(&self, current: Option<Version>) -> bool {
        match (self, current) {
            (ExpectedVersion::Absent, None) => true,
            (ExpectedVersion::Exactly(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

impl std::fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedVersion::Absent => write!(f, "absent"),
            ExpectedVersion::Exactly(v) => write!(f, "version {v}"),
        }
    }
}

/// A stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Collection (entity kind) the document belongs to.
    pub collection: String,

    /// Identifier, unique within the collection.
    pub id: String,

    /// Current version.
    pub version: Version,

    /// When the document was first written.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The entity itself.
    pub body: serde_json::Value,
}

impl Document {
    /// Deserializes the body into a typed entity.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.body)
    }
}
