//! Purchase request workflow: buyer asks, seller decides.

use common::{BuyerId, ProductId, RequestId, SellerId};
use document_store::DocumentStore;
use domain::{DomainError, PurchaseRequest, Repository, RequestStatus};

use crate::cart::CartClient;
use crate::inventory::InventoryLedger;

/// Purchase request service.
///
/// Approval validates stock but reserves nothing. After an approval is
/// saved the item is pushed to the buyer's cart; a failed push is logged and
/// counted, never undone or retried.
pub struct PurchaseRequestService<S, L, C>
where
    S: DocumentStore,
    L: InventoryLedger,
    C: CartClient,
{
    requests: Repository<S, PurchaseRequest>,
    ledger: L,
    cart: C,
}

impl<S, L, C> PurchaseRequestService<S, L, C>
where
    S: DocumentStore,
    L: InventoryLedger,
    C: CartClient,
{
    /// Creates a new purchase request service.
    pub fn new(requests: Repository<S, PurchaseRequest>, ledger: L, cart: C) -> Self {
        Self {
            requests,
            ledger,
            cart,
        }
    }

    /// Opens a Pending request for a product.
    #[tracing::instrument(skip(self, message))]
    pub async fn create(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
        message: Option<String>,
    ) -> Result<PurchaseRequest, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(0));
        }

        let product = self.ledger.product(product_id).await?;
        product.ensure_purchasable(quantity)?;

        let request = PurchaseRequest::new(buyer_id, product.snapshot(), quantity, message);
        self.requests.insert(&request).await?;

        metrics::counter!("purchase_requests_created_total").increment(1);
        tracing::info!(request_id = %request.id, seller_id = %request.seller_id, "purchase request created");
        Ok(request)
    }

    /// Approves a Pending request and pushes it to the buyer's cart.
    ///
    /// Checks run in order: existence, seller ownership, status, stock.
    #[tracing::instrument(skip(self))]
    pub async fn approve(
        &self,
        request_id: RequestId,
        seller_id: SellerId,
    ) -> Result<PurchaseRequest, DomainError> {
        let request = self.requests.load(&request_id.to_string()).await?;
        request.ensure_seller(seller_id, "approve")?;
        request.ensure_can_transition(RequestStatus::Approved, "approve")?;

        if !self
            .ledger
            .check_available(request.product_id, request.quantity)
            .await?
        {
            let available = match self.ledger.product(request.product_id).await {
                Ok(product) if product.status.is_purchasable() => product.stock,
                _ => 0,
            };
            return Err(DomainError::InsufficientStock {
                product_id: request.product_id,
                available,
                requested: request.quantity,
            });
        }

        let (request, ()) = self
            .requests
            .update(&request_id.to_string(), |r| {
                r.ensure_seller(seller_id, "approve")?;
                r.approve()
            })
            .await?;

        metrics::counter!("purchase_requests_approved_total").increment(1);
        tracing::info!(%request_id, buyer_id = %request.buyer_id, "purchase request approved");

        if let Err(e) = self
            .cart
            .add_approved_item(
                request.buyer_id,
                request.id,
                request.snapshot(),
                request.quantity,
            )
            .await
        {
            metrics::counter!("cart_push_failures_total").increment(1);
            tracing::warn!(
                %request_id,
                buyer_id = %request.buyer_id,
                error = %e,
                "approved item could not be pushed to cart"
            );
        }

        Ok(request)
    }

    /// Rejects a Pending request, recording the reason in its message.
    #[tracing::instrument(skip(self))]
    pub async fn reject(
        &self,
        request_id: RequestId,
        seller_id: SellerId,
        reason: Option<String>,
    ) -> Result<PurchaseRequest, DomainError> {
        let (request, ()) = self
            .requests
            .update(&request_id.to_string(), |r| {
                r.ensure_seller(seller_id, "reject")?;
                r.reject(reason.as_deref())
            })
            .await?;

        tracing::info!(%request_id, "purchase request rejected");
        Ok(request)
    }

    /// Withdraws a Pending request. Stock is untouched.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        request_id: RequestId,
        buyer_id: BuyerId,
    ) -> Result<PurchaseRequest, DomainError> {
        let (request, ()) = self
            .requests
            .update(&request_id.to_string(), |r| {
                r.ensure_buyer(buyer_id, "cancel")?;
                r.cancel()
            })
            .await?;

        tracing::info!(%request_id, "purchase request cancelled");
        Ok(request)
    }

    /// Reads a request.
    pub async fn get(&self, request_id: RequestId) -> Result<PurchaseRequest, DomainError> {
        self.requests.load(&request_id.to_string()).await
    }

    /// Requests addressed to a seller, optionally filtered by status.
    pub async fn for_seller(
        &self,
        seller_id: SellerId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PurchaseRequest>, DomainError> {
        let mut query = self
            .requests
            .query()
            .field_eq("seller_id", seller_id.to_string());
        if let Some(status) = status {
            query = query.field_eq("status", status.as_str());
        }
        self.requests.find(query).await
    }

    /// Requests opened by a buyer, optionally filtered by status.
    pub async fn for_buyer(
        &self,
        buyer_id: BuyerId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PurchaseRequest>, DomainError> {
        let mut query = self
            .requests
            .query()
            .field_eq("buyer_id", buyer_id.to_string());
        if let Some(status) = status {
            query = query.field_eq("status", status.as_str());
        }
        self.requests.find(query).await
    }
}
