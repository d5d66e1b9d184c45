//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Identity headers missing or malformed.
    MissingIdentity(String),
    /// Malformed path, query or body.
    BadRequest(String),
    /// Error raised by a workflow operation.
    Domain(DomainError),
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InsufficientStock
        | ErrorKind::ProductUnavailable
        | ErrorKind::EmptyCart
        | ErrorKind::AmountTooLarge
        | ErrorKind::InvalidAmount
        | ErrorKind::InvalidQuantity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::GatewayError => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingIdentity(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: msg,
                    kind: ErrorKind::Unauthorized,
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    kind: ErrorKind::BadRequest,
                },
            ),
            ApiError::Domain(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                if status.is_server_error() {
                    tracing::error!(error = %err, ?kind, "request failed");
                }
                (
                    status,
                    ErrorBody {
                        error: err.to_string(),
                        kind,
                    },
                )
            }
        };

        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
