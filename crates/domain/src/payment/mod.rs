//! Payments collected through the external gateway.

mod state;

pub use state::PaymentStatus;

use chrono::{DateTime, Utc};
use common::{BuyerId, CartId, Currency, Money, PaymentId, ProductId, SellerId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Entity};

/// Largest amount, in minor units, the gateway accepts for one order.
pub const GATEWAY_AMOUNT_CEILING: i64 = 1_000_000_000;

/// A line being paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
    pub seller_id: SellerId,
}

/// A payment attempt for the contents of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub buyer_id: BuyerId,
    pub cart_id: CartId,
    pub items: Vec<PaymentItem>,
    pub amount: Money,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a Pending payment.
    pub fn pending(
        buyer_id: BuyerId,
        cart_id: CartId,
        items: Vec<PaymentItem>,
        amount: Money,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            buyer_id,
            cart_id,
            items,
            amount,
            currency,
            status: PaymentStatus::Pending,
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_signature: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fails unless `buyer` owns this payment.
    pub fn ensure_buyer(&self, buyer: BuyerId) -> Result<(), DomainError> {
        if self.buyer_id != buyer {
            return Err(DomainError::Unauthorized {
                entity: Self::entity_name(),
                id: self.id.to_string(),
                action: "access",
            });
        }
        Ok(())
    }

    /// Fails unless the payment is waiting for confirmation.
    pub fn ensure_confirmable(&self) -> Result<(), DomainError> {
        if !self.status.can_confirm() {
            return Err(self.invalid_state("confirm"));
        }
        Ok(())
    }

    /// Records the gateway order and moves to Created.
    pub fn mark_created(&mut self, gateway_order_id: String) -> Result<(), DomainError> {
        if !self.status.can_create() {
            return Err(self.invalid_state("create a gateway order for"));
        }
        self.gateway_order_id = Some(gateway_order_id);
        self.status = PaymentStatus::Created;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records the capture and moves to Success.
    pub fn mark_captured(
        &mut self,
        gateway_payment_id: String,
        signature: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_confirmable()?;
        self.gateway_payment_id = Some(gateway_payment_id);
        self.gateway_signature = signature;
        self.status = PaymentStatus::Success;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a failure and moves to Failed.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.can_fail() {
            return Err(self.invalid_state("fail"));
        }
        self.error_message = Some(message.into());
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn invalid_state(&self, action: &'static str) -> DomainError {
        DomainError::InvalidState {
            entity: Self::entity_name(),
            current: self.status.to_string(),
            action,
        }
    }
}

impl Entity for Payment {
    fn collection() -> &'static str {
        "payments"
    }

    fn entity_name() -> &'static str {
        "payment"
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
