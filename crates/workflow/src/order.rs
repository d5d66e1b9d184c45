//! Order workflow: checkout, status progression and cancellation.

use common::{BuyerId, OrderId, ProductId};
use document_store::DocumentStore;
use domain::{CartItem, DomainError, Order, OrderItem, OrderStatus, Repository};

use crate::cart::CartClient;
use crate::inventory::InventoryLedger;

/// Order service.
///
/// Checkout commits stock line by line with no cross-line atomicity: if a
/// later line fails, stock already taken for earlier lines stays taken.
pub struct OrderService<S, L, C>
where
    S: DocumentStore,
    L: InventoryLedger,
    C: CartClient,
{
    orders: Repository<S, Order>,
    ledger: L,
    cart: C,
}

impl<S, L, C> OrderService<S, L, C>
where
    S: DocumentStore,
    L: InventoryLedger,
    C: CartClient,
{
    /// Creates a new order service.
    pub fn new(orders: Repository<S, Order>, ledger: L, cart: C) -> Self {
        Self {
            orders,
            ledger,
            cart,
        }
    }

    /// Turns the buyer's cart into a Confirmed order.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn checkout(
        &self,
        buyer_id: BuyerId,
        shipping_address: Option<String>,
    ) -> Result<Order, DomainError> {
        metrics::counter!("checkouts_total").increment(1);
        let started = std::time::Instant::now();

        let cart = self.cart.cart(buyer_id).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let items = cart
            .items
            .iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let order = Order::confirmed(buyer_id, items, shipping_address)?;

        let mut committed: Vec<ProductId> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            if let Err(e) = self.commit_line(item).await {
                if !committed.is_empty() {
                    metrics::counter!("checkout_partial_failures_total").increment(1);
                    tracing::warn!(
                        %buyer_id,
                        failed_product = %item.product_id,
                        already_decremented = ?committed,
                        error = %e,
                        "checkout failed after stock was decremented for earlier lines"
                    );
                }
                return Err(e);
            }
            committed.push(item.product_id);
        }

        self.orders.insert(&order).await?;

        if let Err(e) = self.cart.clear(buyer_id).await {
            metrics::counter!("cart_clear_failures_total").increment(1);
            tracing::warn!(%buyer_id, order_id = %order.id, error = %e, "cart not cleared after checkout");
        }

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total = %order.total, lines = order.items.len(), "order confirmed");
        Ok(order)
    }

    async fn commit_line(&self, item: &CartItem) -> Result<(), DomainError> {
        let product = self.ledger.product(item.product_id).await?;
        product.ensure_purchasable(item.quantity)?;
        self.ledger.decrement(item.product_id, item.quantity).await?;
        Ok(())
    }

    /// Moves an order forward through its lifecycle.
    ///
    /// Requesting the current status is a no-op. Cancelling is not a status
    /// update; use `cancel`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let (order, changed) = self
            .orders
            .update(&order_id.to_string(), |o| o.advance_to(status))
            .await?;

        if changed {
            tracing::info!(%order_id, %status, "order status updated");
        }
        Ok(order)
    }

    /// Cancels an order and gives its stock back.
    ///
    /// The order is marked Cancelled first, so of two concurrent cancels only
    /// one restores stock. Per-line restore failures are logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, buyer_id: BuyerId) -> Result<Order, DomainError> {
        let (order, ()) = self
            .orders
            .update(&order_id.to_string(), |o| {
                o.ensure_buyer(buyer_id, "cancel")?;
                o.cancel()
            })
            .await?;

        for item in &order.items {
            if let Err(e) = self.ledger.restore(item.product_id, item.quantity).await {
                metrics::counter!("stock_restore_failures_total").increment(1);
                tracing::warn!(
                    %order_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "stock not restored for cancelled order line"
                );
            }
        }

        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }

    /// Reads one of the buyer's orders.
    pub async fn get(&self, order_id: OrderId, buyer_id: BuyerId) -> Result<Order, DomainError> {
        let order = self.orders.load(&order_id.to_string()).await?;
        order.ensure_buyer(buyer_id, "view")?;
        Ok(order)
    }

    /// A buyer's orders, optionally filtered by status.
    pub async fn for_buyer(
        &self,
        buyer_id: BuyerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let mut query = self
            .orders
            .query()
            .field_eq("buyer_id", buyer_id.to_string());
        if let Some(status) = status {
            query = query.field_eq("status", status.as_str());
        }
        self.orders.find(query).await
    }
}
