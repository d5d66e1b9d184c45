//! Purchase request endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ProductId, RequestId};
use domain::{DomainError, PurchaseRequest, RequestStatus};
use serde::Deserialize;

use super::{StatusFilter, optional_json, parse_id};
use crate::AppState;
use crate::error::ApiError;
use crate::identity::{BuyerIdentity, SellerIdentity, UserIdentity};

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
}

fn request_id(raw: &str) -> Result<RequestId, ApiError> {
    parse_id(raw, "request id")
}

/// POST /requests: a buyer asks a seller for a product.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<PurchaseRequest>), ApiError> {
    let request = state
        .requests
        .create(buyer_id, body.product_id, body.quantity, body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /requests: requests the calling buyer opened.
#[tracing::instrument(skip(state))]
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Query(filter): Query<StatusFilter<RequestStatus>>,
) -> Result<Json<Vec<PurchaseRequest>>, ApiError> {
    Ok(Json(state.requests.for_buyer(buyer_id, filter.status).await?))
}

/// GET /requests/incoming: requests addressed to the calling seller.
#[tracing::instrument(skip(state))]
pub async fn list_incoming(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Query(filter): Query<StatusFilter<RequestStatus>>,
) -> Result<Json<Vec<PurchaseRequest>>, ApiError> {
    Ok(Json(
        state.requests.for_seller(seller_id, filter.status).await?,
    ))
}

/// GET /requests/{id}: visible to its buyer and its seller.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    user: UserIdentity,
    Path(id): Path<String>,
) -> Result<Json<PurchaseRequest>, ApiError> {
    let request = state.requests.get(request_id(&id)?).await?;
    if !user.is_party(request.buyer_id, request.seller_id) {
        return Err(DomainError::Unauthorized {
            entity: "purchase request",
            id,
            action: "view",
        }
        .into());
    }
    Ok(Json(request))
}

/// POST /requests/{id}/approve
#[tracing::instrument(skip(state))]
pub async fn approve(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Path(id): Path<String>,
) -> Result<Json<PurchaseRequest>, ApiError> {
    Ok(Json(
        state.requests.approve(request_id(&id)?, seller_id).await?,
    ))
}

/// POST /requests/{id}/reject: optional body `{"reason": "..."}`.
#[tracing::instrument(skip(state, body))]
pub async fn reject(
    State(state): State<Arc<AppState>>,
    SellerIdentity(seller_id): SellerIdentity,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PurchaseRequest>, ApiError> {
    let RejectBody { reason } = optional_json(&body)?.unwrap_or_default();
    Ok(Json(
        state
            .requests
            .reject(request_id(&id)?, seller_id, reason)
            .await?,
    ))
}

/// POST /requests/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(id): Path<String>,
) -> Result<Json<PurchaseRequest>, ApiError> {
    Ok(Json(state.requests.cancel(request_id(&id)?, buyer_id).await?))
}
