//! Purchase requests from buyers to sellers.

mod state;

pub use state::RequestStatus;

use chrono::{DateTime, Utc};
use common::{BuyerId, Money, ProductId, RequestId, SellerId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Entity, ItemSnapshot};

/// A buyer's request to purchase a quantity of a seller's product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub id: RequestId,
    pub buyer_id: BuyerId,
    pub seller_id: SellerId,
    pub product_id: ProductId,
    pub product_name: String,
    pub theme_id: Option<String>,
    pub quantity: u32,
    pub price: Money,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseRequest {
    /// Creates a Pending request from a product snapshot.
    pub fn new(
        buyer_id: BuyerId,
        snapshot: ItemSnapshot,
        quantity: u32,
        message: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            buyer_id,
            seller_id: snapshot.seller_id,
            product_id: snapshot.product_id,
            product_name: snapshot.product_name,
            theme_id: snapshot.theme_id,
            quantity,
            price: snapshot.price,
            status: RequestStatus::Pending,
            message,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fails unless `seller` is the seller addressed by this request.
    pub fn ensure_seller(&self, seller: SellerId, action: &'static str) -> Result<(), DomainError> {
        if self.seller_id != seller {
            return Err(self.unauthorized(action));
        }
        Ok(())
    }

    /// Fails unless `buyer` created this request.
    pub fn ensure_buyer(&self, buyer: BuyerId, action: &'static str) -> Result<(), DomainError> {
        if self.buyer_id != buyer {
            return Err(self.unauthorized(action));
        }
        Ok(())
    }

    /// Fails unless the request may move to `next`.
    pub fn ensure_can_transition(
        &self,
        next: RequestStatus,
        action: &'static str,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidState {
                entity: Self::entity_name(),
                current: self.status.to_string(),
                action,
            });
        }
        Ok(())
    }

    /// Marks the request Approved.
    pub fn approve(&mut self) -> Result<(), DomainError> {
        self.transition(RequestStatus::Approved, "approve")
    }

    /// Marks the request Rejected, appending the reason to the message.
    pub fn reject(&mut self, reason: Option<&str>) -> Result<(), DomainError> {
        self.transition(RequestStatus::Rejected, "reject")?;
        if let Some(reason) = reason {
            let note = format!("[Rejected: {reason}]");
            self.message = Some(match self.message.take() {
                Some(message) if !message.is_empty() => format!("{message} {note}"),
                _ => note,
            });
        }
        Ok(())
    }

    /// Marks the request Cancelled.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(RequestStatus::Cancelled, "cancel")
    }

    /// Product snapshot taken when the request was created.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            price: self.price,
            theme_id: self.theme_id.clone(),
            seller_id: self.seller_id,
        }
    }

    fn transition(&mut self, next: RequestStatus, action: &'static str) -> Result<(), DomainError> {
        self.ensure_can_transition(next, action)?;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn unauthorized(&self, action: &'static str) -> DomainError {
        DomainError::Unauthorized {
            entity: Self::entity_name(),
            id: self.id.to_string(),
            action,
        }
    }
}

impl Entity for PurchaseRequest {
    fn collection() -> &'static str {
        "purchase_requests"
    }

    fn entity_name() -> &'static str {
        "purchase request"
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: Option<&str>) -> PurchaseRequest {
        PurchaseRequest::new(
            BuyerId::new(),
            ItemSnapshot {
                product_id: ProductId::new(),
                product_name: "Vase".to_string(),
                price: Money::from_major(40),
                theme_id: Some("floral".to_string()),
                seller_id: SellerId::new(),
            },
            2,
            message.map(str::to_string),
        )
    }

    #[test]
    fn new_request_is_pending() {
        let r = request(None);
        assert_eq!(r.status, RequestStatus::Pending);
        assert_eq!(r.snapshot().product_name, "Vase");
    }

    #[test]
    fn approve_only_from_pending() {
        let mut r = request(None);
        r.approve().unwrap();
        assert_eq!(r.status, RequestStatus::Approved);

        let again = r.approve();
        assert!(matches!(again, Err(DomainError::InvalidState { .. })));
        assert_eq!(r.status, RequestStatus::Approved);
    }

    #[test]
    fn reject_appends_reason_to_message() {
        let mut r = request(Some("Gift wrap please"));
        r.reject(Some("out of season")).unwrap();
        assert_eq!(r.status, RequestStatus::Rejected);
        assert_eq!(
            r.message.as_deref(),
            Some("Gift wrap please [Rejected: out of season]")
        );
    }

    #[test]
    fn reject_without_message_or_reason() {
        let mut r = request(None);
        r.reject(Some("no stock")).unwrap();
        assert_eq!(r.message.as_deref(), Some("[Rejected: no stock]"));

        let mut r = request(Some("hi"));
        r.reject(None).unwrap();
        assert_eq!(r.message.as_deref(), Some("hi"));
    }

    #[test]
    fn cancelled_request_cannot_be_rejected() {
        let mut r = request(None);
        r.cancel().unwrap();
        assert!(matches!(r.reject(None), Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn ownership_checks() {
        let r = request(None);
        assert!(r.ensure_seller(r.seller_id, "approve").is_ok());
        assert!(r.ensure_buyer(r.buyer_id, "cancel").is_ok());
        assert!(matches!(
            r.ensure_seller(SellerId::new(), "approve"),
            Err(DomainError::Unauthorized { .. })
        ));
        assert!(matches!(
            r.ensure_buyer(BuyerId::new(), "cancel"),
            Err(DomainError::Unauthorized { .. })
        ));
    }
}
