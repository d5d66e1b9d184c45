//! HTTP surface for the marketplace workflow.
//!
//! Every component gets its own router; the single binary merges them. A
//! component can also be pointed at a remote peer, in which case the matching
//! collaborator trait is served by an HTTP client instead of the in-process
//! service.

pub mod clients;
pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod wire;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use document_store::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError};
use domain::Repository;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use workflow::{
    CartClient, CartService, InMemoryGateway, InventoryLedger, LedgerService, OrderService,
    PaymentGateway, PaymentService, PaymentSettings, PurchaseRequestService,
};

use clients::{HttpCartClient, HttpInventoryClient, HttpPaymentGateway};
use config::Config;

pub type Store = Arc<dyn DocumentStore>;
pub type Ledger = Arc<dyn InventoryLedger>;
pub type Carts = Arc<dyn CartClient>;
pub type Gateway = Arc<dyn PaymentGateway>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub inventory: Arc<LedgerService<Store>>,
    pub carts: Arc<CartService<Store, Ledger>>,
    pub requests: PurchaseRequestService<Store, Ledger, Carts>,
    pub orders: OrderService<Store, Ledger, Carts>,
    pub payments: PaymentService<Store, Ledger, Gateway>,
}

/// Where each collaborator lives. `None` means in-process.
pub struct Collaborators {
    pub ledger: Option<Ledger>,
    pub cart: Option<Carts>,
    pub gateway: Gateway,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            ledger: None,
            cart: None,
            gateway: Arc::new(InMemoryGateway::new()),
        }
    }
}

/// Failures while assembling the application at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("http client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Wires the services over one document store.
pub fn create_state(
    store: Store,
    collaborators: Collaborators,
    settings: PaymentSettings,
) -> Arc<AppState> {
    let inventory = Arc::new(LedgerService::new(Repository::new(store.clone())));
    let ledger = collaborators
        .ledger
        .unwrap_or_else(|| inventory.clone() as Ledger);

    let carts = Arc::new(CartService::new(
        Repository::new(store.clone()),
        ledger.clone(),
    ));
    let cart = collaborators
        .cart
        .unwrap_or_else(|| carts.clone() as Carts);

    Arc::new(AppState {
        requests: PurchaseRequestService::new(
            Repository::new(store.clone()),
            ledger.clone(),
            cart.clone(),
        ),
        orders: OrderService::new(Repository::new(store.clone()), ledger.clone(), cart),
        payments: PaymentService::new(
            Repository::new(store),
            ledger,
            collaborators.gateway,
            settings,
        ),
        inventory,
        carts,
    })
}

/// Creates the default application state: in-memory store, every component
/// in-process, in-memory gateway.
pub fn create_default_state() -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryDocumentStore::new()),
        Collaborators::default(),
        PaymentSettings::default(),
    )
}

/// Builds the application state described by `config`.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let store: Store = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            let store = PostgresDocumentStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL document store");
            Arc::new(store)
        }
        None => {
            tracing::info!("using in-memory document store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let client = clients::http_client(config.remote_timeout)?;
    let mut collaborators = Collaborators::default();

    if let Some(url) = &config.inventory_url {
        tracing::info!(%url, "inventory ledger is remote");
        collaborators.ledger = Some(Arc::new(HttpInventoryClient::new(client.clone(), url)));
    }
    if let Some(url) = &config.cart_url {
        tracing::info!(%url, "cart is remote");
        collaborators.cart = Some(Arc::new(HttpCartClient::new(client.clone(), url)));
    }
    match &config.gateway {
        Some(gateway) => {
            tracing::info!(url = %gateway.url, "using external payment gateway");
            collaborators.gateway = Arc::new(HttpPaymentGateway::new(
                client,
                &gateway.url,
                &gateway.key_id,
                &gateway.key_secret,
            ));
        }
        None => tracing::warn!("no payment gateway configured, using in-memory gateway"),
    }

    let settings = PaymentSettings {
        currency: config.currency.clone(),
        settle_stock_on_capture: config.settle_stock_on_capture,
        ..PaymentSettings::default()
    };

    Ok(create_state(store, collaborators, settings))
}

/// Inventory routes, public and internal.
pub fn inventory_router() -> Router<Arc<AppState>> {
    use routes::inventory;

    Router::new()
        .route(
            "/inventory/products",
            post(inventory::register).get(inventory::list_own),
        )
        .route("/inventory/products/{id}", get(inventory::get))
        .route("/inventory/products/{id}/stock", put(inventory::update_stock))
        .route("/inventory/products/{id}/status", put(inventory::set_status))
        .route(
            "/inventory/products/{id}/availability",
            get(inventory::availability),
        )
        .route("/inventory/products/{id}/decrement", post(inventory::decrement))
        .route("/inventory/products/{id}/restore", post(inventory::restore))
}

/// Cart routes for buyers plus the internal routes peers call.
pub fn cart_router() -> Router<Arc<AppState>> {
    use routes::cart;

    Router::new()
        .route("/cart", get(cart::get).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_quantity).delete(cart::remove_item),
        )
        .route(
            "/internal/carts/{buyer_id}",
            get(cart::internal_get).delete(cart::internal_clear),
        )
        .route(
            "/internal/carts/{buyer_id}/approved-items",
            post(cart::internal_add_approved),
        )
}

/// Purchase request routes.
pub fn requests_router() -> Router<Arc<AppState>> {
    use routes::requests;

    Router::new()
        .route("/requests", post(requests::create).get(requests::list_mine))
        .route("/requests/incoming", get(requests::list_incoming))
        .route("/requests/{id}", get(requests::get))
        .route("/requests/{id}/approve", post(requests::approve))
        .route("/requests/{id}/reject", post(requests::reject))
        .route("/requests/{id}/cancel", post(requests::cancel))
}

/// Order routes.
pub fn orders_router() -> Router<Arc<AppState>> {
    use routes::orders;

    Router::new()
        .route("/orders/checkout", post(orders::checkout))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/cancel", post(orders::cancel))
}

/// Payment routes.
pub fn payments_router() -> Router<Arc<AppState>> {
    use routes::payments;

    Router::new()
        .route("/payments", post(payments::create).get(payments::list))
        .route("/payments/{id}", get(payments::get))
        .route("/payments/{id}/confirm", post(payments::confirm))
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .merge(inventory_router())
        .merge(cart_router())
        .merge(requests_router())
        .merge(orders_router())
        .merge(payments_router())
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
