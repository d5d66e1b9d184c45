//! Buyer carts.

use chrono::{DateTime, Utc};
use common::{BuyerId, CartId, Money, ProductId, RequestId, SellerId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Entity, ItemSnapshot};

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
    pub theme_id: Option<String>,
    pub seller_id: SellerId,
    /// Purchase request this line came from, if it was pushed on approval.
    pub request_id: Option<RequestId>,
}

impl CartItem {
    fn from_snapshot(snapshot: ItemSnapshot, quantity: u32, request_id: Option<RequestId>) -> Self {
        Self {
            product_id: snapshot.product_id,
            product_name: snapshot.product_name,
            price: snapshot.price,
            quantity,
            theme_id: snapshot.theme_id,
            seller_id: snapshot.seller_id,
            request_id,
        }
    }

    /// Price times quantity.
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.price.checked_mul(self.quantity).ok_or_else(|| {
            DomainError::InvalidAmount(format!(
                "{} x {} of product {} overflows",
                self.price, self.quantity, self.product_id
            ))
        })
    }

    /// True for lines the buyer added directly rather than through approval.
    pub fn is_direct(&self) -> bool {
        self.request_id.is_none()
    }
}

/// A buyer's cart. Each buyer has at most one, keyed by buyer id.
///
/// `total` is recomputed from the lines after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub buyer_id: BuyerId,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a buyer.
    pub fn new(buyer_id: BuyerId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            buyer_id,
            items: Vec::new(),
            total: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if a line already carries this request id.
    pub fn contains_request(&self, request_id: RequestId) -> bool {
        self.items
            .iter()
            .any(|item| item.request_id == Some(request_id))
    }

    /// Quantity of the direct line for a product, if any.
    pub fn direct_quantity(&self, product_id: ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id && item.is_direct())
            .map(|item| item.quantity)
    }

    /// Units of a product held on every line except the first.
    pub fn other_lines_quantity(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .skip(1)
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Quantity held on the first line for a product, if any.
    pub fn line_quantity(&self, product_id: ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
    }

    /// Appends the line for an approved purchase request.
    ///
    /// Returns false, leaving the cart untouched, if the request is already
    /// in the cart.
    pub fn add_approved(
        &mut self,
        request_id: RequestId,
        snapshot: ItemSnapshot,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        if self.contains_request(request_id) {
            return Ok(false);
        }
        self.items
            .push(CartItem::from_snapshot(snapshot, quantity, Some(request_id)));
        self.touch()?;
        Ok(true)
    }

    /// Adds units of a product, merging into an existing direct line.
    pub fn add_direct(&mut self, snapshot: ItemSnapshot, quantity: u32) -> Result<(), DomainError> {
        let product_id = snapshot.product_id;
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id && item.is_direct())
        {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(DomainError::InvalidQuantity(i64::from(quantity)))?
            }
            None => self
                .items
                .push(CartItem::from_snapshot(snapshot, quantity, None)),
        }
        self.touch()
    }

    /// Sets the quantity of the first line for a product.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| DomainError::NotFound {
                entity: "cart item",
                id: product_id.to_string(),
            })?;
        item.quantity = quantity;
        self.touch()
    }

    /// Removes every line for a product. Returns true if any was removed.
    pub fn remove(&mut self, product_id: ProductId) -> Result<bool, DomainError> {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.touch()?;
        Ok(self.items.len() != before)
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Money::zero();
        self.updated_at = Utc::now();
    }

    /// Sum of line subtotals, failing instead of wrapping on overflow.
    pub fn computed_total(&self) -> Result<Money, DomainError> {
        let subtotals = self
            .items
            .iter()
            .map(CartItem::subtotal)
            .collect::<Result<Vec<_>, _>>()?;
        Money::checked_sum(subtotals)
            .ok_or_else(|| DomainError::InvalidAmount("cart total overflows".to_string()))
    }

    fn touch(&mut self) -> Result<(), DomainError> {
        self.total = self.computed_total()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Entity for Cart {
    fn collection() -> &'static str {
        "carts"
    }

    fn entity_name() -> &'static str {
        "cart"
    }

    fn document_id(&self) -> String {
        self.buyer_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(price_minor: i64) -> ItemSnapshot {
        ItemSnapshot {
            product_id: ProductId::new(),
            product_name: "Mug".to_string(),
            price: Money::from_minor(price_minor),
            theme_id: None,
            seller_id: SellerId::new(),
        }
    }

    fn assert_total_consistent(cart: &Cart) {
        assert_eq!(cart.total, cart.computed_total().unwrap());
    }

    #[test]
    fn approved_item_is_idempotent_on_request_id() {
        let mut cart = Cart::new(BuyerId::new());
        let request_id = RequestId::new();
        let snap = snapshot(500);

        assert!(cart.add_approved(request_id, snap.clone(), 2).unwrap());
        assert!(!cart.add_approved(request_id, snap, 2).unwrap());

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, Money::from_minor(1000));
        assert_total_consistent(&cart);
    }

    #[test]
    fn direct_add_merges_only_into_direct_line() {
        let mut cart = Cart::new(BuyerId::new());
        let snap = snapshot(300);

        cart.add_approved(RequestId::new(), snap.clone(), 1).unwrap();
        cart.add_direct(snap.clone(), 2).unwrap();
        cart.add_direct(snap.clone(), 1).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.direct_quantity(snap.product_id), Some(3));
        assert_eq!(cart.line_quantity(snap.product_id), Some(1));
        assert_eq!(cart.other_lines_quantity(snap.product_id), 3);
        assert_eq!(cart.total, Money::from_minor(1200));
        assert_total_consistent(&cart);
    }

    #[test]
    fn set_quantity_and_remove_recompute_total() {
        let mut cart = Cart::new(BuyerId::new());
        let a = snapshot(100);
        let b = snapshot(250);
        cart.add_direct(a.clone(), 1).unwrap();
        cart.add_direct(b.clone(), 2).unwrap();

        cart.set_quantity(a.product_id, 4).unwrap();
        assert_eq!(cart.total, Money::from_minor(900));
        assert_total_consistent(&cart);

        assert!(cart.remove(b.product_id).unwrap());
        assert_eq!(cart.total, Money::from_minor(400));
        assert!(!cart.remove(b.product_id).unwrap());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.total.is_zero());
    }

    #[test]
    fn set_quantity_of_missing_line_is_not_found() {
        let mut cart = Cart::new(BuyerId::new());
        let result = cart.set_quantity(ProductId::new(), 1);
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn overflowing_total_fails_and_keeps_previous_total() {
        let mut cart = Cart::new(BuyerId::new());
        let cheap = snapshot(100);
        cart.add_direct(cheap, 1).unwrap();

        let huge = snapshot(i64::MAX / 2 + 1);
        let result = cart.add_direct(huge.clone(), 2);
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        assert_eq!(cart.total, Money::from_minor(100));

        let mut other = Cart::new(BuyerId::new());
        other.add_direct(huge.clone(), 1).unwrap();
        let result = other.add_approved(RequestId::new(), huge, 1);
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn document_is_keyed_by_buyer() {
        let buyer = BuyerId::new();
        assert_eq!(Cart::new(buyer).document_id(), buyer.to_string());
    }
}
