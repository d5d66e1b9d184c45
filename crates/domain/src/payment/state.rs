//! Payment state machine.

use serde::{Deserialize, Serialize};

/// The status of a payment.
///
/// State transitions:
/// ```text
/// Pending ──► Created ──► Success ──► Refunded
///    │           │
///    └───────────┴──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Recorded locally, gateway not contacted yet.
    #[default]
    Pending,

    /// Gateway order created, awaiting the buyer's payment.
    Created,

    /// Gateway reported the payment captured.
    Success,

    /// Gateway refused, errored, or reported a non-captured status (terminal).
    Failed,

    /// Money returned to the buyer (terminal).
    Refunded,
}

impl PaymentStatus {
    /// Returns true if a gateway order may be attached in this status.
    pub fn can_create(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Returns true if the payment may be confirmed in this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, PaymentStatus::Created)
    }

    /// Returns true if the payment may fail in this status.
    pub fn can_fail(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Created)
    }

    /// Returns true if the payment may be refunded in this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Created => "CREATED",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_created_can_be_confirmed() {
        assert!(!PaymentStatus::Pending.can_confirm());
        assert!(PaymentStatus::Created.can_confirm());
        assert!(!PaymentStatus::Success.can_confirm());
        assert!(!PaymentStatus::Failed.can_confirm());
        assert!(!PaymentStatus::Refunded.can_confirm());
    }

    #[test]
    fn failure_before_success_only() {
        assert!(PaymentStatus::Pending.can_fail());
        assert!(PaymentStatus::Created.can_fail());
        assert!(!PaymentStatus::Success.can_fail());
        assert!(!PaymentStatus::Failed.can_fail());
    }

    #[test]
    fn refund_after_success_only() {
        assert!(PaymentStatus::Success.can_refund());
        assert!(!PaymentStatus::Created.can_refund());
    }
}
