//! Caller identity as propagated by the edge gateway.
//!
//! The gateway authenticates a caller once and forwards these headers on every
//! downstream request. Components trust them and only compare ownership.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying the authenticated user id, whatever the role.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Header carrying the buyer id, present only for buyers.
pub const BUYER_ID_HEADER: &str = "x-buyer-id";

/// Header carrying the seller id, present only for sellers.
pub const SELLER_ID_HEADER: &str = "x-seller-id";

/// Role claimed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "BUYER",
            Role::Seller => "SELLER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role string.
#[derive(Debug, Clone, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Role::Buyer),
            "SELLER" => Ok(Role::Seller),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
