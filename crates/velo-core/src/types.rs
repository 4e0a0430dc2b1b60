//! # Domain Types
//!
//! Core domain types used throughout Velo POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │  UserProfile    │   │     Order       │   │  WheelConfig    │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id             │   │  id (UUID)      │   │  segments[]     │        │
//! │  │  spin_attempts  │   │  status         │   │  min_order      │        │
//! │  │  total_spent    │   │  lines[]        │   └─────────────────┘        │
//! │  └─────────────────┘   │  totals         │                              │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   OrderStatus   │   │    CartLine     │   │  WheelSegment   │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  Pending        │   │  product_id     │   │  label          │        │
//! │  │  Paid           │   │  unit price     │   │  discount %     │        │
//! │  │  Cancelled      │   │  voucher?       │   │  color          │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`crate::voucher`] module owns the Voucher type and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// User Profile
// =============================================================================

/// Role of a shop account. Determines which back-office operations the
/// presentation layer offers; the identity provider enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Staff,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// Whether the account may transact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Disabled,
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::Active
    }
}

/// Per-user promotion state.
///
/// ## Invariants
/// - `spin_attempts` never goes negative
/// - `total_spent_cents` is monotonically non-decreasing; it only grows on
///   a pending → paid order transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque user id, owned by the identity provider.
    pub id: String,

    pub role: UserRole,

    /// Balance of unused spin attempts.
    pub spin_attempts: i64,

    /// Cumulative total of qualifying (paid) orders, in cents.
    pub total_spent_cents: i64,

    pub account_status: AccountStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// When the user last spun the wheel.
    pub last_spin_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Creates a fresh profile with zeroed balances.
    ///
    /// Used both at signup and as the late-profile fallback: a paid order
    /// for a user without a profile creates one rather than failing.
    pub fn new(id: impl Into<String>, role: UserRole, now: DateTime<Utc>) -> Self {
        UserProfile {
            id: id.into(),
            role,
            spin_attempts: 0,
            total_spent_cents: 0,
            account_status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
            last_spin_at: None,
        }
    }

    /// Total spent as Money.
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

// =============================================================================
// Spin Wheel Configuration
// =============================================================================

/// One prize slot on the spin wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelSegment {
    pub id: String,

    /// Label painted on the wheel ("10% OFF", "Try again", ...).
    pub label: String,

    /// Discount granted when this segment wins. Zero means "no win":
    /// the spin is still consumed but no voucher is minted.
    pub discount_percent: u32,

    /// Display color for the storefront wheel.
    pub color: String,
}

/// Singleton, admin-editable wheel configuration.
///
/// Selection is uniform across the list. Odds are therefore controlled by
/// repeating entries (typically zero-discount "no win" slots), which is the
/// intended configuration knob, not a bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub segments: Vec<WheelSegment>,

    /// A paid order must total at least this much to grant a spin attempt.
    pub min_order_cents: i64,
}

impl WheelConfig {
    /// The segment landed for a uniform roll in `0..segments.len()`.
    pub fn segment_at(&self, roll: usize) -> Option<&WheelSegment> {
        self.segments.get(roll)
    }

    /// Threshold as Money.
    #[inline]
    pub fn min_order(&self) -> Money {
        Money::from_cents(self.min_order_cents)
    }
}

impl Default for WheelConfig {
    /// The wheel the shop ships with: three discount slots and five
    /// "no win" slots, so the effective win odds are 3 in 8.
    fn default() -> Self {
        let no_win = |id: &str| WheelSegment {
            id: id.to_string(),
            label: "Try again".to_string(),
            discount_percent: 0,
            color: "#9ca3af".to_string(),
        };
        WheelConfig {
            segments: vec![
                WheelSegment {
                    id: "seg-5".to_string(),
                    label: "5% OFF".to_string(),
                    discount_percent: 5,
                    color: "#38bdf8".to_string(),
                },
                no_win("seg-n1"),
                WheelSegment {
                    id: "seg-10".to_string(),
                    label: "10% OFF".to_string(),
                    discount_percent: 10,
                    color: "#34d399".to_string(),
                },
                no_win("seg-n2"),
                no_win("seg-n3"),
                WheelSegment {
                    id: "seg-15".to_string(),
                    label: "15% OFF".to_string(),
                    discount_percent: 15,
                    color: "#fbbf24".to_string(),
                },
                no_win("seg-n4"),
                no_win("seg-n5"),
            ],
            min_order_cents: 100_000,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A voucher applied to a single cart line.
///
/// The discount percentage is snapshotted here so the cart renders stably,
/// but the Voucher record remains the source of truth at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherApplication {
    pub voucher_id: String,
    pub code: String,
    pub discount_percent: u32,
}

/// One line of a user's cart.
///
/// Price and name are frozen at add-to-cart time (snapshot pattern), so the
/// cart stays consistent if the product record changes underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,

    /// At most one voucher per line; a voucher may appear on at most one
    /// line of the cart.
    pub voucher: Option<VoucherApplication>,
}

impl CartLine {
    /// Unit price as Money, with malformed (negative) values coerced to 0.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents.max(0))
    }

    /// Quantity with malformed (negative) values coerced to 0.
    #[inline]
    pub fn effective_quantity(&self) -> i64 {
        self.quantity.max(0)
    }

    /// Line subtotal before any discount: unit price × quantity.
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.effective_quantity())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ```text
///            ┌─────────┐
///   approve  │ pending │  cancel(reason)
///      ┌─────┴────┬────┴─────┐
///      ▼          │          ▼
///  ┌───────┐      │     ┌───────────┐
///  │ paid  │      │     │ cancelled │
///  └───────┘      │     └───────────┘
///   terminal              terminal
/// ```
///
/// Paid and Cancelled are terminal: no further status transition exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, awaiting admin approval.
    Pending,
    /// Approved and settled. Vouchers on the order are consumed.
    Paid,
    /// Cancelled with a reason. Vouchers on the order are released.
    Cancelled,
}

impl OrderStatus {
    /// The exact string stored in the record store. Must stay in sync with
    /// the serde representation; conditional updates compare against it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the status admits no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    CashOnDelivery,
}

// =============================================================================
// Order
// =============================================================================

/// A line item on an order, frozen at checkout (snapshot pattern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name: String,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit price × quantity, before discount.
    pub line_subtotal_cents: i64,

    /// Voucher applied to this line, if any.
    pub voucher_id: Option<String>,
    pub voucher_code: Option<String>,
    pub discount_percent: Option<u32>,

    /// Discount in cents. Computed against the unit price only, never
    /// price × quantity: one voucher discounts one unit of the line.
    pub discount_cents: i64,

    /// line_subtotal − discount.
    pub final_price_cents: i64,
}

/// A customer order.
///
/// ## Invariants
/// - `total_cents = subtotal_cents − discount_cents`, floored at 0
/// - once `status` leaves Pending the order is immutable except for
///   `is_rated` (and the internal `rewarded` bookkeeping flag)
/// - `cancel_reason` is Some iff status is Cancelled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,

    /// Whether the customer has rated the (paid) order.
    pub is_rated: bool,

    /// Whether the spin-attempt grant for this order's pending → paid
    /// transition has been recorded. Guarded by a conditional update so the
    /// grant applies exactly once even if the transition is retried.
    pub rewarded: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Ids of all vouchers referenced by this order's lines.
    pub fn voucher_ids(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| line.voucher_id.clone())
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
