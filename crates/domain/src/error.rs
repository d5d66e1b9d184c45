//! Domain error types.

use common::ProductId;
use document_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller does not own the entity it tried to act on.
    #[error("not authorized to {action} {entity} {id}")]
    Unauthorized {
        entity: &'static str,
        id: String,
        action: &'static str,
    },

    /// The entity's current status does not allow the action.
    #[error("cannot {action} {entity} in status {current}")]
    InvalidState {
        entity: &'static str,
        current: String,
        action: &'static str,
    },

    /// Not enough stock for the requested quantity.
    #[error("insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The product exists but cannot be purchased right now.
    #[error("product {product_id} is not available (status {status})")]
    ProductUnavailable {
        product_id: ProductId,
        status: String,
    },

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Amount exceeds what the payment gateway accepts.
    #[error("amount {minor_units} exceeds the gateway limit of {ceiling} minor units")]
    AmountTooLarge { minor_units: i64, ceiling: i64 },

    /// A price or amount is negative, zero where it must be positive, or too
    /// large to compute with.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The payment gateway rejected or failed a call.
    #[error("gateway error: {0}")]
    GatewayError(String),

    /// Quantities must be at least one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// Optimistic concurrency retries were exhausted.
    #[error("{entity} {id} kept changing underneath the update after {attempts} attempts")]
    Conflict {
        entity: &'static str,
        id: String,
        attempts: u32,
    },

    /// An error occurred in the document store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error reported by another component over the network.
    #[error("{message}")]
    Remote { kind: ErrorKind, message: String },
}

impl DomainError {
    /// Classifies the error for callers that only care about its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Unauthorized { .. } => ErrorKind::Unauthorized,
            DomainError::InvalidState { .. } => ErrorKind::InvalidState,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::ProductUnavailable { .. } => ErrorKind::ProductUnavailable,
            DomainError::EmptyCart => ErrorKind::EmptyCart,
            DomainError::AmountTooLarge { .. } => ErrorKind::AmountTooLarge,
            DomainError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            DomainError::GatewayError(_) => ErrorKind::GatewayError,
            DomainError::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            DomainError::Conflict { .. } => ErrorKind::Conflict,
            DomainError::Store(_) | DomainError::Serialization(_) => ErrorKind::Internal,
            DomainError::Remote { kind, .. } => *kind,
        }
    }
}

/// Error category, shared across component boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    InsufficientStock,
    ProductUnavailable,
    EmptyCart,
    AmountTooLarge,
    InvalidAmount,
    GatewayError,
    InvalidQuantity,
    Conflict,
    BadRequest,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        assert_eq!(DomainError::EmptyCart.kind(), ErrorKind::EmptyCart);
        assert_eq!(
            DomainError::InsufficientStock {
                product_id: ProductId::new(),
                available: 1,
                requested: 2,
            }
            .kind(),
            ErrorKind::InsufficientStock
        );
        assert_eq!(
            DomainError::Remote {
                kind: ErrorKind::NotFound,
                message: "gone".to_string(),
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn kind_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InsufficientStock).unwrap(),
            "\"INSUFFICIENT_STOCK\""
        );
        let kind: ErrorKind = serde_json::from_str("\"AMOUNT_TOO_LARGE\"").unwrap();
        assert_eq!(kind, ErrorKind::AmountTooLarge);
        assert_eq!(
            serde_json::to_string(&DomainError::InvalidAmount("x".into()).kind()).unwrap(),
            "\"INVALID_AMOUNT\""
        );
    }
}
