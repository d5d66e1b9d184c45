//! Products held by the inventory ledger.

mod state;

pub use state::ProductStatus;

use chrono::{DateTime, Utc};
use common::{Money, ProductId, SellerId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Entity};

/// Seller input for registering a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub theme_id: Option<String>,
}

/// Purchase-time copy of a product's descriptive fields.
///
/// Carts, requests and orders keep these so later catalog edits don't
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub theme_id: Option<String>,
    pub seller_id: SellerId,
}

/// A product and its stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub theme_id: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an Active product, or OutOfStock when registered with no stock.
    ///
    /// Negative prices are rejected.
    pub fn register(seller_id: SellerId, new: NewProduct) -> Result<Self, DomainError> {
        if new.price.is_negative() {
            return Err(DomainError::InvalidAmount(format!(
                "price must not be negative, got {}",
                new.price
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            seller_id,
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            theme_id: new.theme_id,
            status: ProductStatus::Active.for_stock(new.stock),
            created_at: now,
            updated_at: now,
        })
    }

    /// True iff the product is Active and holds at least `quantity` units.
    pub fn is_available(&self, quantity: u32) -> bool {
        self.status.is_purchasable() && self.stock >= quantity
    }

    /// Fails unless the product can be bought in `quantity` units.
    ///
    /// Status is checked before stock, so an Inactive product reports
    /// `ProductUnavailable` even when stock would be short too.
    pub fn ensure_purchasable(&self, quantity: u32) -> Result<(), DomainError> {
        if !self.status.is_purchasable() {
            return Err(DomainError::ProductUnavailable {
                product_id: self.id,
                status: self.status.to_string(),
            });
        }
        self.ensure_stock(quantity)
    }

    /// Fails if fewer than `quantity` units are in stock.
    pub fn ensure_stock(&self, quantity: u32) -> Result<(), DomainError> {
        if self.stock < quantity {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Fails unless `seller` owns the product.
    pub fn ensure_owned_by(&self, seller: SellerId, action: &'static str) -> Result<(), DomainError> {
        if self.seller_id != seller {
            return Err(DomainError::Unauthorized {
                entity: Self::entity_name(),
                id: self.id.to_string(),
                action,
            });
        }
        Ok(())
    }

    /// Takes `quantity` units out of stock.
    pub fn decrement(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(0));
        }
        self.ensure_stock(quantity)?;
        self.stock -= quantity;
        self.status = self.status.for_stock(self.stock);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Puts `quantity` units back into stock.
    pub fn restore(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(0));
        }
        self.stock = self.stock.saturating_add(quantity);
        self.status = self.status.for_stock(self.stock);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrites the stock level.
    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
        self.status = self.status.for_stock(stock);
        self.updated_at = Utc::now();
    }

    /// Applies a seller's status choice.
    ///
    /// Only Active and Inactive may be requested; Active on an empty product
    /// lands on OutOfStock.
    pub fn set_status(&mut self, status: ProductStatus) -> Result<(), DomainError> {
        if !status.is_seller_selectable() {
            return Err(DomainError::InvalidState {
                entity: Self::entity_name(),
                current: self.status.to_string(),
                action: "set status OUT_OF_STOCK on",
            });
        }
        self.status = status.for_stock(self.stock);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns the purchase-time snapshot of this product.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            product_id: self.id,
            product_name: self.name.clone(),
            price: self.price,
            theme_id: self.theme_id.clone(),
            seller_id: self.seller_id,
        }
    }
}

impl Entity for Product {
    fn collection() -> &'static str {
        "products"
    }

    fn entity_name() -> &'static str {
        "product"
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
