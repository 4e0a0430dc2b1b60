//! # Error Types
//!
//! Domain-specific error types for velo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  velo-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  velo-store errors (separate crate)                                     │
//! │  └── StoreError       - Record-store operation failures                 │
//! │                                                                         │
//! │  velo-engine errors                                                     │
//! │  └── EngineError      - Core | Store, what the caller matches on        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Presentation         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries a machine-readable kind plus enough context to
//! render a notification directly; callers must be able to distinguish
//! "voucher expired" from "voucher already reserved" without string parsing.

use std::fmt;

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations or missing entities. They are
/// all recoverable and caller-visible; the presentation layer maps each
/// variant to its own message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User profile cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Voucher cannot be found.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order status change attempted from a terminal or wrong state.
    ///
    /// ## When This Occurs
    /// - Approving or cancelling an order that is already paid or cancelled
    /// - Losing an approve-vs-cancel race between two admins: the loser's
    ///   conditional status write fails and surfaces as this error
    #[error("Order {order_id} is {current_status}, cannot {action}")]
    InvalidTransition {
        order_id: String,
        current_status: OrderStatus,
        action: String,
    },

    /// Voucher exists but cannot be reserved.
    ///
    /// The sub-kind distinguishes reserved / consumed / expired so the
    /// storefront can tell the customer exactly what happened.
    #[error("Voucher {voucher_id} is unavailable: {reason}")]
    VoucherUnavailable {
        voucher_id: String,
        reason: VoucherUnavailableReason,
    },

    /// Checkout attempted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Spin attempted with a zero attempt balance.
    #[error("No spin attempts available")]
    InsufficientAttempts,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Why a voucher reservation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherUnavailableReason {
    /// Another order currently holds the reservation.
    AlreadyReserved,
    /// The voucher has been permanently spent.
    Consumed,
    /// `expires_at` is in the past. Expiry is checked lazily at reserve
    /// time; there is no background sweep.
    Expired,
}

impl fmt::Display for VoucherUnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoucherUnavailableReason::AlreadyReserved => write!(f, "already reserved"),
            VoucherUnavailableReason::Consumed => write!(f, "already consumed"),
            VoucherUnavailableReason::Expired => write!(f, "expired"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// The same voucher was applied to more than one line.
    #[error("Voucher {voucher_id} is applied to more than one cart line")]
    DuplicateVoucher { voucher_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::VoucherUnavailable {
            voucher_id: "v-1".to_string(),
            reason: VoucherUnavailableReason::Expired,
        };
        assert_eq!(err.to_string(), "Voucher v-1 is unavailable: expired");

        let err = CoreError::InvalidTransition {
            order_id: "o-1".to_string(),
            current_status: OrderStatus::Paid,
            action: "cancel".to_string(),
        };
        assert_eq!(err.to_string(), "Order o-1 is paid, cannot cancel");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "cancel_reason".to_string(),
        };
        assert_eq!(err.to_string(), "cancel_reason is required");

        let err = ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "discount_percent must be between 1 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cancel_reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
