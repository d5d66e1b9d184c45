//! Payment workflow: gateway intent, confirmation and stock settlement.

use chrono::Utc;
use common::{BuyerId, CartId, Currency, Money, PaymentId};
use document_store::DocumentStore;
use domain::{DomainError, GATEWAY_AMOUNT_CEILING, Payment, PaymentItem, Repository};
use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayPayment, PaymentGateway};
use crate::inventory::InventoryLedger;

const RECEIPT_MAX_LEN: usize = 40;

/// Knobs for the payment workflow.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Currency used when the caller doesn't name one.
    pub currency: Currency,

    /// Decrement stock again once a payment is captured.
    pub settle_stock_on_capture: bool,

    /// Largest amount, in minor units, sent to the gateway.
    pub amount_ceiling: i64,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            currency: Currency::inr(),
            settle_stock_on_capture: true,
            amount_ceiling: GATEWAY_AMOUNT_CEILING,
        }
    }
}

/// Input for creating a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub cart_id: CartId,
    pub items: Vec<PaymentItem>,
    pub amount: Money,
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Payment service.
///
/// Payments are persisted whatever the gateway answers; failures end up in
/// the payment's status and error message.
pub struct PaymentService<S, L, G>
where
    S: DocumentStore,
    L: InventoryLedger,
    G: PaymentGateway,
{
    payments: Repository<S, Payment>,
    ledger: L,
    gateway: G,
    settings: PaymentSettings,
}

impl<S, L, G> PaymentService<S, L, G>
where
    S: DocumentStore,
    L: InventoryLedger,
    G: PaymentGateway,
{
    /// Creates a new payment service.
    pub fn new(
        payments: Repository<S, Payment>,
        ledger: L,
        gateway: G,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            payments,
            ledger,
            gateway,
            settings,
        }
    }

    /// Returns the active settings.
    pub fn settings(&self) -> &PaymentSettings {
        &self.settings
    }

    /// Records a payment and registers it with the gateway.
    ///
    /// Amounts that are not positive or exceed the gateway ceiling are saved
    /// as Failed and rejected. A gateway error is saved as Failed and returned
    /// as a normal payment.
    #[tracing::instrument(skip(self, new), fields(amount = %new.amount))]
    pub async fn create_intent(
        &self,
        buyer_id: BuyerId,
        new: NewPayment,
    ) -> Result<Payment, DomainError> {
        let currency = new
            .currency
            .unwrap_or_else(|| self.settings.currency.clone());
        let mut payment = Payment::pending(buyer_id, new.cart_id, new.items, new.amount, currency);

        let minor_units = payment.amount.minor_units();
        let rejected = if !payment.amount.is_positive() {
            Some(DomainError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                payment.amount
            )))
        } else if minor_units > self.settings.amount_ceiling {
            Some(DomainError::AmountTooLarge {
                minor_units,
                ceiling: self.settings.amount_ceiling,
            })
        } else {
            None
        };
        if let Some(error) = rejected {
            payment.mark_failed(error.to_string())?;
            self.payments.insert(&payment).await?;
            record_status(&payment);
            tracing::warn!(payment_id = %payment.id, minor_units, error = %error, "payment amount rejected");
            return Err(error);
        }

        match self
            .gateway
            .create_order(minor_units, &payment.currency, &receipt_id())
            .await
        {
            Ok(order) => payment.mark_created(order.id)?,
            Err(e) => {
                tracing::warn!(payment_id = %payment.id, error = %e, "gateway order creation failed");
                payment.mark_failed(format!("Gateway error: {}", gateway_message(&e)))?;
            }
        }

        self.payments.insert(&payment).await?;
        record_status(&payment);
        tracing::info!(payment_id = %payment.id, status = %payment.status, "payment created");
        Ok(payment)
    }

    /// Confirms a Created payment against the gateway.
    ///
    /// A captured payment becomes Success and, with settlement on, stock is
    /// decremented for every line. Settlement failures are logged per line
    /// and never revert the payment. A gateway payment made against another
    /// gateway order fails the payment.
    #[tracing::instrument(skip(self, signature))]
    pub async fn confirm(
        &self,
        payment_id: PaymentId,
        gateway_payment_id: String,
        signature: Option<String>,
    ) -> Result<Payment, DomainError> {
        let payment = self.payments.load(&payment_id.to_string()).await?;
        payment.ensure_confirmable()?;

        let fetched = self.gateway.fetch_payment(&gateway_payment_id).await;

        let (payment, captured) = self
            .payments
            .update(&payment_id.to_string(), |p| match &fetched {
                Ok(remote) if !belongs_to(remote, p) => {
                    p.ensure_confirmable()?;
                    let other = remote.order_id.as_deref().unwrap_or_default();
                    p.mark_failed(format!("Payment order mismatch: {other}"))?;
                    Ok(false)
                }
                Ok(remote) if remote.is_captured() => {
                    p.mark_captured(gateway_payment_id.clone(), signature.clone())?;
                    Ok(true)
                }
                Ok(remote) => {
                    p.ensure_confirmable()?;
                    p.mark_failed(format!("Payment status: {}", remote.status))?;
                    Ok(false)
                }
                Err(e) => {
                    p.ensure_confirmable()?;
                    p.mark_failed(gateway_message(e))?;
                    Ok(false)
                }
            })
            .await?;
        record_status(&payment);

        if !captured {
            tracing::warn!(%payment_id, message = ?payment.error_message, "payment not captured");
            return Ok(payment);
        }

        tracing::info!(%payment_id, gateway_payment_id = ?payment.gateway_payment_id, "payment captured");
        if self.settings.settle_stock_on_capture {
            self.settle_stock(&payment).await;
        }
        Ok(payment)
    }

    async fn settle_stock(&self, payment: &Payment) {
        for item in &payment.items {
            if let Err(e) = self.ledger.decrement(item.product_id, item.quantity).await {
                metrics::counter!("payment_settlement_failures_total").increment(1);
                tracing::error!(
                    payment_id = %payment.id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "stock not decremented after payment capture"
                );
            }
        }
    }

    /// Reads one of the buyer's payments.
    pub async fn get(&self, payment_id: PaymentId, buyer_id: BuyerId) -> Result<Payment, DomainError> {
        let payment = self.payments.load(&payment_id.to_string()).await?;
        payment.ensure_buyer(buyer_id)?;
        Ok(payment)
    }

    /// A buyer's payments.
    pub async fn for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Payment>, DomainError> {
        self.payments
            .find(
                self.payments
                    .query()
                    .field_eq("buyer_id", buyer_id.to_string()),
            )
            .await
    }

    /// Looks a payment up by the gateway's order id.
    pub async fn by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let mut found = self
            .payments
            .find(
                self.payments
                    .query()
                    .field_eq("gateway_order_id", gateway_order_id)
                    .limit(1),
            )
            .await?;
        Ok(found.pop())
    }
}

/// False when the gateway ties the payment to an order other than ours.
fn belongs_to(remote: &GatewayPayment, payment: &Payment) -> bool {
    match remote.order_id.as_deref() {
        Some(order_id) => payment.gateway_order_id.as_deref() == Some(order_id),
        None => true,
    }
}

/// Receipt id sent to the gateway: `ord_<unix millis>`, at most 40 chars.
fn receipt_id() -> String {
    let mut receipt = format!("ord_{}", Utc::now().timestamp_millis());
    receipt.truncate(RECEIPT_MAX_LEN);
    receipt
}

fn gateway_message(error: &DomainError) -> String {
    match error {
        DomainError::GatewayError(message) => message.clone(),
        other => other.to_string(),
    }
}

fn record_status(payment: &Payment) {
    metrics::counter!("payments_total", "status" => payment.status.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_format() {
        let receipt = receipt_id();
        assert!(receipt.starts_with("ord_"));
        assert!(receipt.len() <= RECEIPT_MAX_LEN);
        assert!(receipt[4..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn default_settings() {
        let settings = PaymentSettings::default();
        assert_eq!(settings.currency, Currency::inr());
        assert!(settings.settle_stock_on_capture);
        assert_eq!(settings.amount_ceiling, 1_000_000_000);
    }

    #[test]
    fn payment_belongs_to_its_gateway_order() {
        let mut payment = Payment::pending(
            BuyerId::new(),
            CartId::new(),
            Vec::new(),
            Money::from_minor(100),
            Currency::inr(),
        );
        payment.mark_created("order_000002".to_string()).unwrap();
        let remote = |order_id: Option<&str>| GatewayPayment {
            id: "pay_1".to_string(),
            order_id: order_id.map(str::to_string),
            status: "captured".to_string(),
            amount: 100,
        };

        assert!(belongs_to(&remote(Some("order_000002")), &payment));
        assert!(belongs_to(&remote(None), &payment));
        assert!(!belongs_to(&remote(Some("order_000001")), &payment));
    }

    #[test]
    fn gateway_message_unwraps_gateway_errors() {
        assert_eq!(
            gateway_message(&DomainError::GatewayError("declined".to_string())),
            "declined"
        );
        assert_eq!(gateway_message(&DomainError::EmptyCart), "cart is empty");
    }
}
