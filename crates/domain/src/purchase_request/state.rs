//! Purchase request state machine.

use serde::{Deserialize, Serialize};

/// The status of a purchase request.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Approved
///           ├──► Rejected
///           └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Waiting for the seller's decision.
    #[default]
    Pending,

    /// Seller accepted; the item was pushed to the buyer's cart (terminal).
    Approved,

    /// Seller declined (terminal).
    Rejected,

    /// Buyer withdrew the request (terminal).
    Cancelled,
}

impl RequestStatus {
    /// Returns true if moving to `next` is allowed.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (*self, next),
            (
                RequestStatus::Pending,
                RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled
            )
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
