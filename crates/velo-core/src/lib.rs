//! # velo-core: Pure Business Logic for Velo POS
//!
//! This crate is the **heart** of the Velo bicycle-shop backend. It contains
//! the promotion and settlement rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Velo POS Data Flow                               │
//! │                                                                         │
//! │  Storefront / Admin UI                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  velo-engine (ledger, spin engine, order lifecycle)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ★ velo-core (THIS CRATE) ★                                             │
//! │                                                                         │
//! │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌────────────┐         │
//! │   │   types   │  │   money   │  │  voucher   │  │ settlement │         │
//! │   │  Order    │  │   Money   │  │  Voucher   │  │  subtotal  │         │
//! │   │  Wheel    │  │  percent  │  │  lifecycle │  │  discounts │         │
//! │   └───────────┘  └───────────┘  └────────────┘  └────────────┘         │
//! │                                                                         │
//! │   NO I/O • NO RECORD STORE • NO CLOCK READS • PURE FUNCTIONS            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  velo-store (record store: users, vouchers, orders, carts, config)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (UserProfile, Order, WheelConfig, CartLine)
//! - [`voucher`] - Voucher lifecycle (available → reserved → consumed)
//! - [`money`] - Money type with integer-cents arithmetic (no floating point!)
//! - [`settlement`] - Cart/order settlement arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; `now` is always a parameter
//! 2. **Integer Money**: all monetary values are cents (i64), never floats
//! 3. **Explicit Errors**: typed error enums, never strings or panics
//! 4. **No ambient state**: user ids are threaded explicitly through every call

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;
pub mod voucher;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, VoucherUnavailableReason};
pub use money::Money;
pub use settlement::{settle, Settlement};
pub use types::*;
pub use voucher::{Voucher, VoucherStatus};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// How long a freshly minted voucher stays usable, in days.
pub const VOUCHER_VALIDITY_DAYS: i64 = 30;

/// Length of the display code printed on a voucher.
///
/// The code is cosmetic: the UUID `id` is the real key, and collisions in
/// the 36^8 code space are accepted rather than enforced against.
pub const VOUCHER_CODE_LENGTH: usize = 8;

/// Alphabet the voucher display code is drawn from.
pub const VOUCHER_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum quantity of a single product on one order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum length of an order cancellation reason.
pub const MAX_CANCEL_REASON_LENGTH: usize = 500;
