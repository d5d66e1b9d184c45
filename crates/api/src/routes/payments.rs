//! Payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::PaymentId;
use domain::Payment;
use serde::Deserialize;
use workflow::NewPayment;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;
use crate::identity::BuyerIdentity;

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub gateway_payment_id: String,
    #[serde(default)]
    pub signature: Option<String>,
}

fn payment_id(raw: &str) -> Result<PaymentId, ApiError> {
    parse_id(raw, "payment id")
}

/// POST /payments: register a payment with the gateway.
///
/// A gateway refusal still answers 201 with a FAILED payment; only an amount
/// over the gateway ceiling is an error.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Json(body): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = state.payments.create_intent(buyer_id, body).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.payments.for_buyer(buyer_id).await?))
}

/// GET /payments/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.payments.get(payment_id(&id)?, buyer_id).await?))
}

/// POST /payments/{id}/confirm: verify with the gateway and settle.
#[tracing::instrument(skip(state, body))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    BuyerIdentity(buyer_id): BuyerIdentity,
    Path(id): Path<String>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id = payment_id(&id)?;
    state.payments.get(payment_id, buyer_id).await?;
    let payment = state
        .payments
        .confirm(payment_id, body.gateway_payment_id, body.signature)
        .await?;
    Ok(Json(payment))
}
