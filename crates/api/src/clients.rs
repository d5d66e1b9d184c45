//! HTTP implementations of the collaborator traits.
//!
//! Used when a component runs in another process. Error responses in the
//! `{"error", "kind"}` shape are turned back into `DomainError::Remote` so
//! callers see the same classification the remote component produced.

use std::time::Duration;

use async_trait::async_trait;
use common::{BuyerId, Currency, ProductId, RequestId};
use domain::{Cart, DomainError, ErrorKind, ItemSnapshot, Product};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use workflow::{CartClient, GatewayOrder, GatewayPayment, InventoryLedger, PaymentGateway};

use crate::error::ErrorBody;
use crate::wire::{ApprovedItemBody, Availability, GatewayOrderBody, QuantityBody};

/// Builds the shared HTTP client.
pub fn http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let builder = Client::builder();
    match timeout {
        Some(timeout) => builder.timeout(timeout).build(),
        None => builder.build(),
    }
}

fn transport_error(err: reqwest::Error) -> DomainError {
    DomainError::Remote {
        kind: ErrorKind::Internal,
        message: format!("remote call failed: {err}"),
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, DomainError> {
    let response = request.send().await.map_err(transport_error)?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DomainError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(transport_error);
    }

    let text = response.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => DomainError::Remote {
            kind: body.kind,
            message: body.error,
        },
        Err(_) => DomainError::Remote {
            kind: ErrorKind::Internal,
            message: format!("remote returned {status}: {text}"),
        },
    })
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Inventory ledger reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn product_url(&self, product_id: ProductId) -> String {
        format!("{}/inventory/products/{product_id}", self.base_url)
    }
}

#[async_trait]
impl InventoryLedger for HttpInventoryClient {
    async fn product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        send(self.client.get(self.product_url(product_id))).await
    }

    async fn check_available(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        let url = format!(
            "{}/availability?quantity={quantity}",
            self.product_url(product_id)
        );
        let availability: Availability = send(self.client.get(url)).await?;
        Ok(availability.available)
    }

    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        let url = format!("{}/decrement", self.product_url(product_id));
        send(self.client.post(url).json(&QuantityBody { quantity })).await
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        let url = format!("{}/restore", self.product_url(product_id));
        send(self.client.post(url).json(&QuantityBody { quantity })).await
    }
}

/// Cart component reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartClient {
    client: Client,
    base_url: String,
}

impl HttpCartClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn cart_url(&self, buyer_id: BuyerId) -> String {
        format!("{}/internal/carts/{buyer_id}", self.base_url)
    }
}

#[async_trait]
impl CartClient for HttpCartClient {
    async fn cart(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        send(self.client.get(self.cart_url(buyer_id))).await
    }

    async fn add_approved_item(
        &self,
        buyer_id: BuyerId,
        request_id: RequestId,
        snapshot: ItemSnapshot,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let url = format!("{}/approved-items", self.cart_url(buyer_id));
        let body = ApprovedItemBody {
            request_id,
            item: snapshot,
            quantity,
        };
        send(self.client.post(url).json(&body)).await
    }

    async fn clear(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        send(self.client.delete(self.cart_url(buyer_id))).await
    }
}

/// External payment gateway reached over HTTP with basic auth.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn new(client: Client, base_url: &str, key_id: &str, key_secret: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DomainError> {
        let response = request
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| DomainError::GatewayError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DomainError::GatewayError(format!(
                "gateway returned {status}: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::GatewayError(format!("unreadable gateway response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &Currency,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError> {
        let body = GatewayOrderBody {
            amount,
            currency: currency.code().to_string(),
            receipt: receipt.to_string(),
        };
        let url = format!("{}/v1/orders", self.base_url);
        self.call(self.client.post(url).json(&body)).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, DomainError> {
        let url = format!("{}/v1/payments/{payment_id}", self.base_url);
        self.call(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = HttpInventoryClient::new(Client::new(), "http://inventory:3000/");
        let id = ProductId::new();
        assert_eq!(
            client.product_url(id),
            format!("http://inventory:3000/inventory/products/{id}")
        );
    }

    #[test]
    fn test_cart_url() {
        let client = HttpCartClient::new(Client::new(), "http://cart");
        let buyer = BuyerId::new();
        assert_eq!(client.cart_url(buyer), format!("http://cart/internal/carts/{buyer}"));
    }
}
