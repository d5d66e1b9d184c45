//! Inventory ledger endpoints.
//!
//! Seller-facing routes manage a seller's own products. The availability,
//! decrement and restore routes back `HttpInventoryClient` and carry no
//! identity.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{NewProduct, Product, ProductStatus};
use serde::Deserialize;
use workflow::InventoryLedger;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;
use crate::identity::SellerIdentity;
use crate::wire::{Availability, QuantityBody};

#[derive(Debug, Deserialize)]
pub struct StockBody {
    pub stock: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ProductStatus,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub quantity: u32,
}

fn product_id(raw: &str) -> Result<ProductId, ApiError> {
    parse_id(raw, "product id")
}

/// POST /inventory/products: register a product for the calling seller.
#[tracing::instrument(skip(state, body))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.inventory.register_product(seller_id, body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /inventory/products: the calling seller's products.
#[tracing::instrument(skip(state))]
pub async fn list_own(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.inventory.products_by_seller(seller_id).await?))
}

/// GET /inventory/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.inventory.product(product_id(&id)?).await?))
}

/// PUT /inventory/products/{id}/stock
#[tracing::instrument(skip(state))]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Path(id): Path<String>,
    Json(body): Json<StockBody>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .inventory
        .update_stock(product_id(&id)?, seller_id, body.stock)
        .await?;
    Ok(Json(product))
}

/// PUT /inventory/products/{id}/status
#[tracing::instrument(skip(state))]
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .inventory
        .set_status(product_id(&id)?, seller_id, body.status)
        .await?;
    Ok(Json(product))
}

/// GET /inventory/products/{id}/availability?quantity=
#[tracing::instrument(skip(state))]
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>, ApiError> {
    let product_id = product_id(&id)?;
    let available = state
        .inventory
        .check_available(product_id, query.quantity)
        .await?;
    Ok(Json(Availability {
        product_id,
        quantity: query.quantity,
        available,
    }))
}

/// POST /inventory/products/{id}/decrement
#[tracing::instrument(skip(state))]
pub async fn decrement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .inventory
        .decrement(product_id(&id)?, body.quantity)
        .await?;
    Ok(Json(product))
}

/// POST /inventory/products/{id}/restore
#[tracing::instrument(skip(state))]
pub async fn restore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .inventory
        .restore(product_id(&id)?, body.quantity)
        .await?;
    Ok(Json(product))
}
