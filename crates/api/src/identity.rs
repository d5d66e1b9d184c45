//! Extractors for the caller identity injected by the edge gateway.
//!
//! Handlers that take one of these extractors never run for a request whose
//! identity headers are missing or malformed; the request is answered with
//! 401 instead.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::identity::{BUYER_ID_HEADER, SELLER_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use common::{BuyerId, Role, SellerId};
use uuid::Uuid;

use crate::error::ApiError;

/// Authenticated buyer, read from `X-Buyer-Id`.
#[derive(Debug, Clone, Copy)]
pub struct BuyerIdentity(pub BuyerId);

/// Authenticated seller, read from `X-Seller-Id`.
#[derive(Debug, Clone, Copy)]
pub struct SellerIdentity(pub SellerId);

/// Any authenticated user, read from `X-User-Id` and `X-User-Role`.
#[derive(Debug, Clone, Copy)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub role: Role,
}

impl UserIdentity {
    /// True if this user is the given buyer or seller.
    pub fn is_party(&self, buyer: BuyerId, seller: SellerId) -> bool {
        match self.role {
            Role::Buyer => buyer.as_uuid() == self.user_id,
            Role::Seller => seller.as_uuid() == self.user_id,
        }
    }
}

fn header<T: FromStr>(parts: &Parts, name: &'static str) -> Result<T, ApiError> {
    let raw = parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::MissingIdentity(format!("missing {name} header")))?;
    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::MissingIdentity(format!("malformed {name} header")))
}

impl<S: Send + Sync> FromRequestParts<S> for BuyerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header(parts, BUYER_ID_HEADER).map(BuyerIdentity)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SellerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header(parts, SELLER_ID_HEADER).map(SellerIdentity)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserIdentity {
            user_id: header(parts, USER_ID_HEADER)?,
            role: header(parts, USER_ROLE_HEADER)?,
        })
    }
}
