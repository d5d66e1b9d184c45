//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{Order, OrderStatus};
use serde::Deserialize;

use super::{StatusFilter, optional_json, parse_id};
use crate::AppState;
use crate::error::ApiError;
use crate::identity::{BuyerIdentity, UserIdentity};

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutBody {
    #[serde(default)]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    parse_id(raw, "order id")
}

/// POST /orders/checkout: turn the buyer's cart into a Confirmed order.
#[tracing::instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let CheckoutBody { shipping_address } = optional_json(&body)?.unwrap_or_default();
    let order = state.orders.checkout(buyer_id, shipping_address).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Query(filter): Query<StatusFilter<OrderStatus>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.for_buyer(buyer_id, filter.status).await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get(order_id(&id)?, buyer_id).await?))
}

/// PUT /orders/{id}/status: forward-only fulfilment transition.
#[tracing::instrument(skip(state))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: UserIdentity,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .update_status(order_id(&id)?, body.status)
        .await?;
    tracing::info!(user_id = %user.user_id, role = %user.role, status = %order.status, "order status updated");
    Ok(Json(order))
}

/// POST /orders/{id}/cancel: cancels and restores stock.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.cancel(order_id(&id)?, buyer_id).await?))
}
