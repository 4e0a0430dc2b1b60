//! # Voucher Lifecycle
//!
//! The Voucher type and its state machine.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Voucher State Machine                              │
//! │                                                                         │
//! │   spin win                reserve(order)            consume             │
//! │  ──────────► available ───────────────► reserved ──────────► consumed  │
//! │                  ▲                         │                    │       │
//! │                  │    release (order       │                    ▼       │
//! │                  └──── cancelled) ─────────┘                 delete     │
//! │                                                             (cleanup)   │
//! │                                                                         │
//! │  reserved → available is the ONLY backward transition, and only the     │
//! │  cancellation of the reserving order triggers it. Consumed is final.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The old storefront tracked this with an `isUsed` flag doing double duty
//! for "reserved" and "consumed" plus a second boolean. The explicit
//! three-state enum makes combinations like used-but-unconsumed-without-an-
//! order unrepresentable.
//!
//! Expiry is passive: `expires_at` is checked when a reservation is
//! attempted, never by a background sweep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, VoucherUnavailableReason};
use crate::money::Money;

// =============================================================================
// Voucher Status
// =============================================================================

/// Where a voucher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    /// Usable: may be applied to a cart line at checkout.
    Available,
    /// Tentatively held by exactly one pending order.
    Reserved,
    /// Permanently spent. Never returns to any other state.
    Consumed,
}

impl VoucherStatus {
    /// The exact string stored in the record store. Conditional updates
    /// compare against it, so it must stay in sync with serde.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Available => "available",
            VoucherStatus::Reserved => "reserved",
            VoucherStatus::Consumed => "consumed",
        }
    }
}

impl std::fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Voucher
// =============================================================================

/// A single-use percentage-off discount grant, tied to one user.
///
/// ## Invariants
/// - non-transferable: only `user_id` may apply it
/// - `order_id` is Some iff status is Reserved or Consumed (kept for audit
///   after consumption)
/// - a Consumed voucher never becomes usable again
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    /// UUID primary key. The real identity of the voucher.
    pub id: String,

    /// Owning user.
    pub user_id: String,

    /// Short display code, 8 chars of `[A-Z0-9]`. Cosmetic and best-effort
    /// unique only; never used as a key.
    pub code: String,

    /// Percentage off a single unit price, 1..=100.
    pub discount_percent: u32,

    pub status: VoucherStatus,

    /// The order currently holding (or having consumed) this voucher.
    pub order_id: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Past this instant the voucher is unusable regardless of status.
    pub expires_at: DateTime<Utc>,

    pub consumed_at: Option<DateTime<Utc>>,
}

impl Voucher {
    /// Whether the voucher is past its expiry at `now`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Usable right now: available and unexpired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == VoucherStatus::Available && !self.is_expired(now)
    }

    /// Checks that a reservation attempt at `now` is legal.
    ///
    /// Distinguishes the three refusal kinds so the storefront can report
    /// exactly why checkout was refused.
    pub fn ensure_reservable(&self, now: DateTime<Utc>) -> CoreResult<()> {
        let reason = match self.status {
            VoucherStatus::Consumed => Some(VoucherUnavailableReason::Consumed),
            VoucherStatus::Reserved => Some(VoucherUnavailableReason::AlreadyReserved),
            VoucherStatus::Available if self.is_expired(now) => {
                Some(VoucherUnavailableReason::Expired)
            }
            VoucherStatus::Available => None,
        };
        match reason {
            Some(reason) => Err(CoreError::VoucherUnavailable {
                voucher_id: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Discount this voucher grants against a unit price.
    ///
    /// Deliberately computed on the unit price, not price × quantity: one
    /// voucher discounts a single unit of the line it is applied to.
    #[inline]
    pub fn discount_on(&self, unit_price: Money) -> Money {
        unit_price.percentage(self.discount_percent)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn voucher(status: VoucherStatus, expires_in_days: i64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: "v-1".to_string(),
            user_id: "u-1".to_string(),
            code: "AB12CD34".to_string(),
            discount_percent: 10,
            status,
            order_id: None,
            created_at: now,
            expires_at: now + Duration::days(expires_in_days),
            consumed_at: None,
        }
    }

    #[test]
    fn test_available_unexpired_is_reservable() {
        let v = voucher(VoucherStatus::Available, 30);
        assert!(v.ensure_reservable(Utc::now()).is_ok());
        assert!(v.is_usable(Utc::now()));
    }

    #[test]
    fn test_reserved_is_not_reservable() {
        let v = voucher(VoucherStatus::Reserved, 30);
        let err = v.ensure_reservable(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::VoucherUnavailable {
                reason: VoucherUnavailableReason::AlreadyReserved,
                ..
            }
        ));
    }

    #[test]
    fn test_consumed_is_not_reservable() {
        let v = voucher(VoucherStatus::Consumed, 30);
        let err = v.ensure_reservable(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::VoucherUnavailable {
                reason: VoucherUnavailableReason::Consumed,
                ..
            }
        ));
    }

    #[test]
    fn test_expired_available_is_rejected() {
        // Available flag alone is not enough: expiry wins
        let v = voucher(VoucherStatus::Available, -1);
        let err = v.ensure_reservable(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::VoucherUnavailable {
                reason: VoucherUnavailableReason::Expired,
                ..
            }
        ));
        assert!(!v.is_usable(Utc::now()));
    }

    #[test]
    fn test_discount_is_unit_price_based() {
        let v = voucher(VoucherStatus::Available, 30);
        // 10% of a 1000-cent unit price, quantity plays no part
        assert_eq!(v.discount_on(Money::from_cents(1000)).cents(), 100);
    }

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            VoucherStatus::Available,
            VoucherStatus::Reserved,
            VoucherStatus::Consumed,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().to_string()));
        }
    }
}
