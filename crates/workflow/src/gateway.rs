//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::Currency;
use domain::DomainError;
use serde::{Deserialize, Serialize};

/// An order registered with the gateway, which the buyer then pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

/// A payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub amount: i64,
}

impl GatewayPayment {
    /// True if the gateway reports the money as captured.
    pub fn is_captured(&self) -> bool {
        self.status.eq_ignore_ascii_case("captured")
    }
}

/// Trait for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers an order of `amount` minor units.
    async fn create_order(
        &self,
        amount: i64,
        currency: &Currency,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError>;

    /// Looks up a payment made against one of our orders.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, DomainError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_order(
        &self,
        amount: i64,
        currency: &Currency,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError> {
        (**self).create_order(amount, currency, receipt).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, DomainError> {
        (**self).fetch_payment(payment_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    orders: HashMap<String, GatewayOrder>,
    payments: HashMap<String, GatewayPayment>,
    next_id: u32,
    fail_on_create: bool,
    fail_on_fetch: bool,
}

/// In-memory payment gateway for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the gateway to fail order creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Configures the gateway to fail payment lookups.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state().fail_on_fetch = fail;
    }

    /// Simulates the buyer paying for `order_id`; returns the payment id.
    pub fn record_payment(&self, order_id: &str, status: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("pay_{:06}", state.next_id);
        let amount = state.orders.get(order_id).map(|o| o.amount).unwrap_or(0);
        state.payments.insert(
            id.clone(),
            GatewayPayment {
                id: id.clone(),
                order_id: Some(order_id.to_string()),
                status: status.to_string(),
                amount,
            },
        );
        id
    }

    /// Returns the number of orders created.
    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    /// Returns a previously created order.
    pub fn order(&self, order_id: &str) -> Option<GatewayOrder> {
        self.state().orders.get(order_id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &Currency,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError> {
        let mut state = self.state();

        if state.fail_on_create {
            return Err(DomainError::GatewayError(
                "order creation declined".to_string(),
            ));
        }

        state.next_id += 1;
        let order = GatewayOrder {
            id: format!("order_{:06}", state.next_id),
            amount,
            currency: currency.code().to_string(),
            receipt: receipt.to_string(),
            status: "created".to_string(),
        };
        state.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, DomainError> {
        let state = self.state();

        if state.fail_on_fetch {
            return Err(DomainError::GatewayError(
                "gateway unreachable".to_string(),
            ));
        }

        state
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| DomainError::GatewayError(format!("payment {payment_id} does not exist")))
    }
}
