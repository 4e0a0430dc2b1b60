//! # Validation Module
//!
//! Business rule validation, run before any record-store write.
//!
//! Validators return [`ValidationError`] so callers can surface the exact
//! field and constraint that failed; the engine wraps them into
//! `CoreError::Validation` via `#[from]`.

use crate::error::ValidationError;
use crate::types::WheelConfig;
use crate::{MAX_CANCEL_REASON_LENGTH, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a voucher discount percentage.
///
/// ## Rules
/// - Must be between 1 and 100 inclusive. A zero-percent voucher is never
///   minted (zero-discount wheel segments simply produce no voucher).
pub fn validate_discount_percent(percent: u32) -> ValidationResult<()> {
    if !(1..=100).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 1,
            max: 100,
        });
    }
    Ok(())
}

/// Validates a line quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates an order cancellation reason.
///
/// ## Rules
/// - Mandatory: blank or whitespace-only reasons are rejected
/// - At most [`MAX_CANCEL_REASON_LENGTH`] characters
pub fn validate_cancel_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "cancel_reason".to_string(),
        });
    }

    if reason.len() > MAX_CANCEL_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "cancel_reason".to_string(),
            max: MAX_CANCEL_REASON_LENGTH,
        });
    }

    Ok(())
}

/// Validates an admin-submitted wheel configuration.
///
/// ## Rules
/// - At least one segment (a spin must always land somewhere)
/// - Segment discounts at most 100%; zero is allowed ("no win" slots)
/// - Threshold must not be negative
pub fn validate_wheel_config(config: &WheelConfig) -> ValidationResult<()> {
    if config.segments.is_empty() {
        return Err(ValidationError::Required {
            field: "segments".to_string(),
        });
    }

    for segment in &config.segments {
        if segment.discount_percent > 100 {
            return Err(ValidationError::OutOfRange {
                field: "segment.discount_percent".to_string(),
                min: 0,
                max: 100,
            });
        }
    }

    if config.min_order_cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "min_order_cents".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
