//! Route handlers, one module per component.

pub mod cart;
pub mod inventory;
pub mod ops;
pub mod orders;
pub mod payments;
pub mod requests;

use std::str::FromStr;

use axum::body::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `?status=` filter on list endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusFilter<T> {
    pub status: Option<T>,
}

/// Parses an identifier taken from the path.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {what}: {raw}")))
}

/// Decodes a JSON body that may be absent altogether.
pub(crate) fn optional_json<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))
}
