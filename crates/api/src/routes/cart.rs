//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{BuyerId, ProductId};
use domain::Cart;
use serde::Deserialize;
use workflow::CartClient;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;
use crate::identity::BuyerIdentity;
use crate::wire::ApprovedItemBody;

#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: i64,
}

/// GET /cart
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(state.carts.cart(buyer_id).await?))
}

/// POST /cart/items: add units of a product directly.
#[tracing::instrument(skip(state))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Json(body): Json<AddItemBody>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .add_item(buyer_id, body.product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// PUT /cart/items/{product_id}: zero or less removes the line.
#[tracing::instrument(skip(state))]
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateQuantityBody>,
) -> Result<Json<Cart>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product id")?;
    let cart = state
        .carts
        .update_quantity(buyer_id, product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart/items/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(product_id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product id")?;
    Ok(Json(state.carts.remove_item(buyer_id, product_id).await?))
}

/// DELETE /cart
#[tracing::instrument(skip(state))]
pub async fn clear(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(state.carts.clear(buyer_id).await?))
}

fn buyer_id(raw: &str) -> Result<BuyerId, ApiError> {
    parse_id(raw, "buyer id")
}

/// GET /internal/carts/{buyer_id}
#[tracing::instrument(skip(state))]
pub async fn internal_get(
    State(state): State<Arc<AppState>>,
    Path(buyer): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(state.carts.cart(buyer_id(&buyer)?).await?))
}

/// POST /internal/carts/{buyer_id}/approved-items: approval push.
#[tracing::instrument(skip(state, body))]
pub async fn internal_add_approved(
    State(state): State<Arc<AppState>>,
    Path(buyer): Path<String>,
    Json(body): Json<ApprovedItemBody>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .add_approved_item(buyer_id(&buyer)?, body.request_id, body.item, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /internal/carts/{buyer_id}
#[tracing::instrument(skip(state))]
pub async fn internal_clear(
    State(state): State<Arc<AppState>>,
    Path(buyer): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(state.carts.clear(buyer_id(&buyer)?).await?))
}
