//! Typed identifiers.
//!
//! Each identifier wraps a UUID so a buyer id can never be passed where a
//! seller id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of a product held by the inventory ledger.
    ProductId
);
uuid_id!(
    /// Identifier of a buyer, as injected by the edge gateway.
    BuyerId
);
uuid_id!(
    /// Identifier of a seller, as injected by the edge gateway.
    SellerId
);
uuid_id!(
    /// Identifier of a purchase request.
    RequestId
);
uuid_id!(
    /// Identifier of an order.
    OrderId
);
uuid_id!(
    /// Identifier of a payment.
    PaymentId
);
uuid_id!(
    /// Identifier of a cart. A buyer has at most one cart.
    CartId
);
