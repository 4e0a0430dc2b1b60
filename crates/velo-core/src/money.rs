//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The storefront this system replaces computed discounts in floating     │
//! │  point with display-time rounding:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every monetary value is an i64 number of cents. Percentage           │
//! │    discounts round exactly once, at the point the discount is           │
//! │    computed, never during accumulation.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use velo_core::money::Money;
//!
//! let price = Money::from_cents(100_000); // a 1000.00 bicycle part
//!
//! // 10% voucher discount on the unit price
//! let discount = price.percentage(10);
//! assert_eq!(discount.cents(), 10_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate arithmetic may dip negative; totals are
///   floored at zero where business rules require it
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the major unit portion (e.g. whole dollars).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Multiplies by a line quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes `percent`% of this amount, rounding half up.
    ///
    /// This is the single rounding point for voucher discounts: the base is
    /// a unit price, the result is stored, and no further rounding happens
    /// during accumulation.
    ///
    /// ## Example
    /// ```rust
    /// use velo_core::money::Money;
    ///
    /// let unit = Money::from_cents(1000);
    /// assert_eq!(unit.percentage(10).cents(), 100);
    ///
    /// // 12.5 rounds up to 13
    /// assert_eq!(Money::from_cents(125).percentage(10).cents(), 13);
    /// ```
    pub fn percentage(&self, percent: u32) -> Money {
        // i128 intermediate prevents overflow on large amounts
        let amount = (self.0 as i128 * percent as i128 + 50) / 100;
        Money(amount as i64)
    }

    /// Returns `self` floored at zero.
    ///
    /// Order totals must never go negative even if a misconfigured discount
    /// exceeds the subtotal.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. UI formatting and localization live in the
/// presentation layer, not here.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing line amounts into a subtotal.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(a.multiply_quantity(2).cents(), 2000);
    }

    #[test]
    fn test_percentage_exact() {
        // 10% of 1000 = 100, no rounding involved
        let unit = Money::from_cents(1000);
        assert_eq!(unit.percentage(10).cents(), 100);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 10% of 125 = 12.5 → 13
        assert_eq!(Money::from_cents(125).percentage(10).cents(), 13);
        // 33% of 100 = 33
        assert_eq!(Money::from_cents(100).percentage(33).cents(), 33);
        // 1% of 49 = 0.49 → 0
        assert_eq!(Money::from_cents(49).percentage(1).cents(), 0);
        // 1% of 50 = 0.5 → 1
        assert_eq!(Money::from_cents(50).percentage(1).cents(), 1);
    }

    #[test]
    fn test_percentage_full() {
        // 100% discount consumes the whole unit price
        assert_eq!(Money::from_cents(7399).percentage(100).cents(), 7399);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(0).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(42).clamp_non_negative().cents(), 42);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300]
            .iter()
            .map(|c| Money::from_cents(*c))
            .sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
