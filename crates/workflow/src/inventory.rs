//! Inventory ledger: the single owner of product stock.

use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, SellerId};
use document_store::DocumentStore;
use domain::{DomainError, NewProduct, Product, ProductStatus, Repository};

/// Stock operations other components may invoke.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Reads a product.
    async fn product(&self, product_id: ProductId) -> Result<Product, DomainError>;

    /// True iff the product exists, is Active and has at least `quantity`
    /// units. Never changes anything.
    async fn check_available(&self, product_id: ProductId, quantity: u32)
    -> Result<bool, DomainError>;

    /// Takes units out of stock. Not idempotent.
    async fn decrement(&self, product_id: ProductId, quantity: u32)
    -> Result<Product, DomainError>;

    /// Puts units back into stock.
    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError>;
}

#[async_trait]
impl<T: InventoryLedger + ?Sized> InventoryLedger for Arc<T> {
    async fn product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        (**self).product(product_id).await
    }

    async fn check_available(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        (**self).check_available(product_id, quantity).await
    }

    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        (**self).decrement(product_id, quantity).await
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        (**self).restore(product_id, quantity).await
    }
}

/// Inventory ledger backed by a document store.
///
/// Every stock change is a compare-and-swap on the product document, so two
/// concurrent decrements can never both spend the same units.
pub struct LedgerService<S>
where
    S: DocumentStore,
{
    products: Repository<S, Product>,
}

impl<S> LedgerService<S>
where
    S: DocumentStore,
{
    /// Creates a new ledger.
    pub fn new(products: Repository<S, Product>) -> Self {
        Self { products }
    }

    /// Registers a seller's product.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn register_product(
        &self,
        seller_id: SellerId,
        new: NewProduct,
    ) -> Result<Product, DomainError> {
        let product = Product::register(seller_id, new)?;
        self.products.insert(&product).await?;
        tracing::info!(product_id = %product.id, stock = product.stock, "product registered");
        Ok(product)
    }

    /// Overwrites a product's stock level.
    #[tracing::instrument(skip(self))]
    pub async fn update_stock(
        &self,
        product_id: ProductId,
        seller_id: SellerId,
        stock: u32,
    ) -> Result<Product, DomainError> {
        let (product, ()) = self
            .products
            .update(&product_id.to_string(), |p| {
                p.ensure_owned_by(seller_id, "update stock of")?;
                p.set_stock(stock);
                Ok(())
            })
            .await?;
        tracing::info!(%product_id, stock, status = %product.status, "stock updated");
        Ok(product)
    }

    /// Applies a seller's Active/Inactive choice.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        product_id: ProductId,
        seller_id: SellerId,
        status: ProductStatus,
    ) -> Result<Product, DomainError> {
        let (product, ()) = self
            .products
            .update(&product_id.to_string(), |p| {
                p.ensure_owned_by(seller_id, "change status of")?;
                p.set_status(status)
            })
            .await?;
        tracing::info!(%product_id, status = %product.status, "product status changed");
        Ok(product)
    }

    /// Lists a seller's products.
    pub async fn products_by_seller(&self, seller_id: SellerId) -> Result<Vec<Product>, DomainError> {
        self.products
            .find(
                self.products
                    .query()
                    .field_eq("seller_id", seller_id.to_string()),
            )
            .await
    }
}

#[async_trait]
impl<S> InventoryLedger for LedgerService<S>
where
    S: DocumentStore,
{
    async fn product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        self.products.load(&product_id.to_string()).await
    }

    async fn check_available(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        Ok(self
            .products
            .get(&product_id.to_string())
            .await?
            .is_some_and(|p| p.is_available(quantity)))
    }

    #[tracing::instrument(skip(self))]
    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        let (product, ()) = self
            .products
            .update(&product_id.to_string(), |p| p.decrement(quantity))
            .await?;

        metrics::counter!("inventory_decrements_total").increment(1);
        tracing::info!(
            %product_id,
            quantity,
            remaining = product.stock,
            status = %product.status,
            "stock decremented"
        );
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<Product, DomainError> {
        let (product, ()) = self
            .products
            .update(&product_id.to_string(), |p| p.restore(quantity))
            .await?;

        metrics::counter!("inventory_restores_total").increment(1);
        tracing::info!(
            %product_id,
            quantity,
            remaining = product.stock,
            status = %product.status,
            "stock restored"
        );
        Ok(product)
    }
}
