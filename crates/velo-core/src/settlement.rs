//! # Order Settlement
//!
//! Pure settlement arithmetic for carts and orders.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Arithmetic                               │
//! │                                                                         │
//! │  subtotal  = Σ (unit price × quantity)                                  │
//! │  line disc = voucher% of the UNIT price (one unit only, by design)      │
//! │  discount  = Σ line discounts                                           │
//! │  total     = max(subtotal − discount, 0)                                │
//! │                                                                         │
//! │  Example: [{1000 × 2}, {500 × 1, 10% voucher}]                          │
//! │    subtotal = 2500, discount = 50, total = 2450                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit-price discount base (rather than price × quantity) is a
//! deliberate business restriction carried over from the shop's original
//! promotion terms: a voucher discounts a single unit of the line it is
//! applied to.
//!
//! Malformed numeric input (negative prices or quantities from a corrupted
//! cart document) is coerced to zero instead of poisoning the totals.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, OrderLine};

// =============================================================================
// Settlement Result
// =============================================================================

/// Computed totals for a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl Settlement {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Settlement Functions
// =============================================================================

/// Discount for one line: the applied voucher's percentage of the unit
/// price, or zero when no voucher is applied.
pub fn line_discount(line: &CartLine) -> Money {
    match &line.voucher {
        // Percent is validated at 1..=100 upstream; the cap here keeps a
        // corrupted document from driving a line total negative.
        Some(applied) => line.unit_price().percentage(applied.discount_percent.min(100)),
        None => Money::zero(),
    }
}

/// Computes subtotal, aggregate discount, and grand total for a cart.
pub fn settle(lines: &[CartLine]) -> Settlement {
    let subtotal: Money = lines.iter().map(CartLine::line_subtotal).sum();
    let discount: Money = lines.iter().map(line_discount).sum();
    let total = (subtotal - discount).clamp_non_negative();

    Settlement {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount.cents(),
        total_cents: total.cents(),
    }
}

/// Rejects a cart that applies the same voucher to more than one line.
pub fn ensure_unique_vouchers(lines: &[CartLine]) -> CoreResult<()> {
    let mut seen: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(applied) = &line.voucher {
            if seen.contains(&applied.voucher_id.as_str()) {
                return Err(ValidationError::DuplicateVoucher {
                    voucher_id: applied.voucher_id.clone(),
                }
                .into());
            }
            seen.push(applied.voucher_id.as_str());
        }
    }
    Ok(())
}

/// Freezes a cart line into an order line (snapshot pattern).
pub fn to_order_line(line: &CartLine) -> OrderLine {
    let line_subtotal = line.line_subtotal();
    let discount = line_discount(line);
    let final_price = (line_subtotal - discount).clamp_non_negative();

    OrderLine {
        product_id: line.product_id.clone(),
        name: line.name.clone(),
        unit_price_cents: line.unit_price().cents(),
        quantity: line.effective_quantity(),
        line_subtotal_cents: line_subtotal.cents(),
        voucher_id: line.voucher.as_ref().map(|v| v.voucher_id.clone()),
        voucher_code: line.voucher.as_ref().map(|v| v.code.clone()),
        discount_percent: line.voucher.as_ref().map(|v| v.discount_percent),
        discount_cents: discount.cents(),
        final_price_cents: final_price.cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
