//! Product availability status.

use serde::{Deserialize, Serialize};

/// Availability of a product.
///
/// ```text
/// Active ◄──── stock > 0 ────► OutOfStock
///   ▲                              │
///   └──────── seller toggle ───► Inactive
/// ```
///
/// OutOfStock is derived from stock and never chosen by a seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Listed and purchasable while stock lasts.
    #[default]
    Active,

    /// Hidden by the seller, regardless of stock.
    Inactive,

    /// Listed but stock is exhausted.
    OutOfStock,
}

impl ProductStatus {
    /// Returns true if the product can be bought in this status.
    pub fn is_purchasable(&self) -> bool {
        matches!(self, ProductStatus::Active)
    }

    /// Returns true if a seller may request this status directly.
    pub fn is_seller_selectable(&self) -> bool {
        matches!(self, ProductStatus::Active | ProductStatus::Inactive)
    }

    /// Status a product should have after its stock became `stock`.
    pub fn for_stock(self, stock: u32) -> ProductStatus {
        match self {
            ProductStatus::Inactive => ProductStatus::Inactive,
            _ if stock == 0 => ProductStatus::OutOfStock,
            ProductStatus::OutOfStock => ProductStatus::Active,
            ProductStatus::Active => ProductStatus::Active,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
            ProductStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_is_purchasable() {
        assert!(ProductStatus::Active.is_purchasable());
        assert!(!ProductStatus::Inactive.is_purchasable());
        assert!(!ProductStatus::OutOfStock.is_purchasable());
    }

    #[test]
    fn status_follows_stock() {
        assert_eq!(ProductStatus::Active.for_stock(0), ProductStatus::OutOfStock);
        assert_eq!(ProductStatus::Active.for_stock(3), ProductStatus::Active);
        assert_eq!(ProductStatus::OutOfStock.for_stock(1), ProductStatus::Active);
        assert_eq!(ProductStatus::OutOfStock.for_stock(0), ProductStatus::OutOfStock);
        assert_eq!(ProductStatus::Inactive.for_stock(0), ProductStatus::Inactive);
        assert_eq!(ProductStatus::Inactive.for_stock(9), ProductStatus::Inactive);
    }

    #[test]
    fn serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::OutOfStock).unwrap(),
            "\"OUT_OF_STOCK\""
        );
    }
}
