//! Orders placed at checkout.

mod state;

pub use state::OrderStatus;

use chrono::{DateTime, Utc};
use common::{BuyerId, Money, OrderId, ProductId, SellerId};
use serde::{Deserialize, Serialize};

use crate::{CartItem, DomainError, Entity};

/// An immutable line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
    pub subtotal: Money,
    pub theme_id: Option<String>,
    pub seller_id: SellerId,
}

impl TryFrom<&CartItem> for OrderItem {
    type Error = DomainError;

    fn try_from(item: &CartItem) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            price: item.price,
            quantity: item.quantity,
            subtotal: item.subtotal()?,
            theme_id: item.theme_id.clone(),
            seller_id: item.seller_id,
        })
    }
}

/// A buyer's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order whose stock has already been committed.
    pub fn confirmed(
        buyer_id: BuyerId,
        items: Vec<OrderItem>,
        shipping_address: Option<String>,
    ) -> Result<Self, DomainError> {
        let total = Money::checked_sum(items.iter().map(|item| item.subtotal))
            .ok_or_else(|| DomainError::InvalidAmount("order total overflows".to_string()))?;
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            buyer_id,
            total,
            items,
            status: OrderStatus::Confirmed,
            shipping_address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fails unless `buyer` placed this order.
    pub fn ensure_buyer(&self, buyer: BuyerId, action: &'static str) -> Result<(), DomainError> {
        if self.buyer_id != buyer {
            return Err(DomainError::Unauthorized {
                entity: Self::entity_name(),
                id: self.id.to_string(),
                action,
            });
        }
        Ok(())
    }

    /// Moves the order forward.
    ///
    /// Returns false when the order is already in `next`.
    pub fn advance_to(&mut self, next: OrderStatus) -> Result<bool, DomainError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidState {
                entity: Self::entity_name(),
                current: self.status.to_string(),
                action: "move to the requested status",
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Marks the order Cancelled.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidState {
                entity: Self::entity_name(),
                current: self.status.to_string(),
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Entity for Order {
    fn collection() -> &'static str {
        "orders"
    }

    fn entity_name() -> &'static str {
        "order"
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_minor: i64, quantity: u32) -> OrderItem {
        let price = Money::from_minor(price_minor);
        OrderItem {
            product_id: ProductId::new(),
            product_name: "Candle".to_string(),
            price,
            quantity,
            subtotal: Money::from_minor(price_minor * i64::from(quantity)),
            theme_id: None,
            seller_id: SellerId::new(),
        }
    }

    #[test]
    fn total_is_sum_of_subtotals() {
        let order =
            Order::confirmed(BuyerId::new(), vec![item(250, 2), item(100, 3)], None).unwrap();
        assert_eq!(order.total, Money::from_minor(800));
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let half = i64::MAX / 2 + 1;
        let result = Order::confirmed(BuyerId::new(), vec![item(half, 1), item(half, 1)], None);
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn advance_through_lifecycle() {
        let mut order = Order::confirmed(BuyerId::new(), vec![item(100, 1)], None).unwrap();
        assert!(order.advance_to(OrderStatus::Shipped).unwrap());
        assert!(!order.advance_to(OrderStatus::Shipped).unwrap());
        assert!(order.advance_to(OrderStatus::Delivered).unwrap());

        let back = order.advance_to(OrderStatus::Confirmed);
        assert!(matches!(back, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn cancel_twice_fails() {
        let mut order = Order::confirmed(BuyerId::new(), vec![item(100, 1)], None).unwrap();
        order.cancel().unwrap();
        assert!(matches!(order.cancel(), Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn delivered_order_cannot_be_cancelled() {
        let mut order = Order::confirmed(BuyerId::new(), vec![item(100, 1)], None).unwrap();
        order.advance_to(OrderStatus::Shipped).unwrap();
        order.advance_to(OrderStatus::Delivered).unwrap();
        assert!(matches!(order.cancel(), Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn order_item_from_cart_line() {
        let line = CartItem {
            product_id: ProductId::new(),
            product_name: "Rug".to_string(),
            price: Money::from_minor(1500),
            quantity: 2,
            theme_id: Some("boho".to_string()),
            seller_id: SellerId::new(),
            request_id: None,
        };
        let item = OrderItem::try_from(&line).unwrap();
        assert_eq!(item.subtotal, Money::from_minor(3000));
        assert_eq!(item.theme_id.as_deref(), Some("boho"));
    }
}
