//! Cart aggregate: one cart per buyer.

use std::sync::Arc;

use async_trait::async_trait;
use common::{BuyerId, ProductId, RequestId};
use document_store::DocumentStore;
use domain::{Cart, DomainError, ItemSnapshot, Product, Repository};

use crate::inventory::InventoryLedger;

/// Cart operations other components may invoke.
#[async_trait]
pub trait CartClient: Send + Sync {
    /// Reads a buyer's cart; a buyer without one gets an empty cart.
    async fn cart(&self, buyer_id: BuyerId) -> Result<Cart, DomainError>;

    /// Adds the line for an approved purchase request.
    ///
    /// Idempotent on `request_id`: pushing the same request twice leaves one
    /// line.
    async fn add_approved_item(
        &self,
        buyer_id: BuyerId,
        request_id: RequestId,
        snapshot: ItemSnapshot,
        quantity: u32,
    ) -> Result<Cart, DomainError>;

    /// Empties a buyer's cart.
    async fn clear(&self, buyer_id: BuyerId) -> Result<Cart, DomainError>;
}

#[async_trait]
impl<T: CartClient + ?Sized> CartClient for Arc<T> {
    async fn cart(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        (**self).cart(buyer_id).await
    }

    async fn add_approved_item(
        &self,
        buyer_id: BuyerId,
        request_id: RequestId,
        snapshot: ItemSnapshot,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        (**self)
            .add_approved_item(buyer_id, request_id, snapshot, quantity)
            .await
    }

    async fn clear(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        (**self).clear(buyer_id).await
    }
}

/// Cart service backed by a document store.
///
/// Carts are created on first touch. The cached total is recomputed on
/// every mutation.
pub struct CartService<S, L>
where
    S: DocumentStore,
    L: InventoryLedger,
{
    carts: Repository<S, Cart>,
    ledger: L,
}

impl<S, L> CartService<S, L>
where
    S: DocumentStore,
    L: InventoryLedger,
{
    /// Creates a new cart service.
    pub fn new(carts: Repository<S, Cart>, ledger: L) -> Self {
        Self { carts, ledger }
    }

    /// Adds units of a product directly, merging into an existing direct
    /// line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(0));
        }

        let product = self.ledger.product(product_id).await?;
        product.ensure_purchasable(quantity)?;
        let snapshot = product.snapshot();

        let (cart, ()) = self
            .mutate(buyer_id, |cart| {
                let combined = cart.direct_quantity(product_id).unwrap_or(0).saturating_add(quantity);
                product.ensure_stock(combined)?;
                cart.add_direct(snapshot.clone(), quantity)
            })
            .await?;

        tracing::info!(%product_id, quantity, total = %cart.total, "item added to cart");
        Ok(cart)
    }

    /// Sets the quantity of a product's first line. Zero or less removes
    /// every line for the product.
    ///
    /// Stock is checked against the new quantity plus whatever the product's
    /// other lines already hold.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, DomainError> {
        if quantity <= 0 {
            return self.remove_item(buyer_id, product_id).await;
        }
        let quantity = u32::try_from(quantity).map_err(|_| DomainError::InvalidQuantity(quantity))?;

        if self.cart(buyer_id).await?.line_quantity(product_id).is_none() {
            return Err(line_not_found(product_id));
        }

        let product = self.ledger.product(product_id).await?;

        let (cart, ()) = self
            .carts
            .update(&buyer_id.to_string(), |cart| {
                let combined = quantity.saturating_add(cart.other_lines_quantity(product_id));
                ensure_available(&product, combined)?;
                cart.set_quantity(product_id, quantity)
            })
            .await?;
        Ok(cart)
    }

    /// Removes every line for a product. Missing lines are ignored.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Cart, DomainError> {
        let (cart, removed) = self
            .mutate(buyer_id, |cart| cart.remove(product_id))
            .await?;
        if removed {
            tracing::info!(%product_id, total = %cart.total, "item removed from cart");
        }
        Ok(cart)
    }

    async fn mutate<T, F>(&self, buyer_id: BuyerId, f: F) -> Result<(Cart, T), DomainError>
    where
        F: FnMut(&mut Cart) -> Result<T, DomainError> + Send,
        T: Send,
    {
        self.carts
            .update_or_create(&buyer_id.to_string(), || Cart::new(buyer_id), f)
            .await
    }
}

fn ensure_available(product: &Product, quantity: u32) -> Result<(), DomainError> {
    if !product.is_available(quantity) {
        return Err(DomainError::InsufficientStock {
            product_id: product.id,
            available: if product.status.is_purchasable() {
                product.stock
            } else {
                0
            },
            requested: quantity,
        });
    }
    Ok(())
}

fn line_not_found(product_id: ProductId) -> DomainError {
    DomainError::NotFound {
        entity: "cart item",
        id: product_id.to_string(),
    }
}

#[async_trait]
impl<S, L> CartClient for CartService<S, L>
where
    S: DocumentStore,
    L: InventoryLedger,
{
    async fn cart(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        if let Some(cart) = self.carts.get(&buyer_id.to_string()).await? {
            return Ok(cart);
        }
        let (cart, ()) = self.mutate(buyer_id, |_| Ok(())).await?;
        Ok(cart)
    }

    #[tracing::instrument(skip(self, snapshot), fields(product_id = %snapshot.product_id))]
    async fn add_approved_item(
        &self,
        buyer_id: BuyerId,
        request_id: RequestId,
        snapshot: ItemSnapshot,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let (cart, added) = self
            .mutate(buyer_id, |cart| {
                cart.add_approved(request_id, snapshot.clone(), quantity)
            })
            .await?;

        if added {
            tracing::info!(%request_id, quantity, total = %cart.total, "approved item added to cart");
        } else {
            tracing::debug!(%request_id, "approved item already in cart");
        }
        Ok(cart)
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self, buyer_id: BuyerId) -> Result<Cart, DomainError> {
        let (cart, ()) = self
            .mutate(buyer_id, |cart| {
                cart.clear();
                Ok(())
            })
            .await?;
        Ok(cart)
    }
}
