use serde_json::{Map, Value};

/// Builder for listing documents of one collection.
///
/// Filters are top-level field equalities on the document body, all of which
/// must hold. Results come back in insertion order.
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    /// Collection to search.
    pub collection: String,

    /// Required field values.
    pub filter: Map<String, Value>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query over a whole collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Map::new(),
            limit: None,
            offset: None,
        }
    }

    /// Requires `field` to equal `value`.
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the body satisfies every filter.
    pub fn matches(&self, body: &Value) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }
}
