//! # velo-engine: Promotion and Order Lifecycle Engine
//!
//! This crate wires the pure rules of `velo-core` to the record store in
//! `velo-store`. It is what the storefront and admin surfaces call.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Velo POS Data Flow                               │
//! │                                                                         │
//! │  Storefront / Admin UI                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  velo-engine (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │  ┌────────────┐ ┌────────────┐ ┌─────────────┐ ┌────────────┐   │    │
//! │  │  │ SpinEngine │ │Entitlement │ │  Voucher    │ │   Order    │   │    │
//! │  │  │ roll, mint │ │  Ledger    │ │  Service    │ │  Service   │   │    │
//! │  │  │  voucher   │ │ grants on  │ │ reserve /   │ │ checkout / │   │    │
//! │  │  │            │ │ paid order │ │ consume /   │ │ approve /  │   │    │
//! │  │  │            │ │            │ │ release     │ │ cancel     │   │    │
//! │  │  └────────────┘ └────────────┘ └─────────────┘ └────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  velo-core (pure rules)        velo-store (records)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Promotion Loop
//!
//! 1. A paid order at or above the wheel threshold grants one spin attempt
//!    ([`EntitlementLedger`], exactly once per order)
//! 2. A spin spends the attempt and may mint a voucher ([`SpinEngine`])
//! 3. Checkout reserves applied vouchers, approval consumes them,
//!    cancellation releases them ([`OrderService`], [`VoucherService`])
//!
//! Every contended write underneath is a conditional update, and every
//! transition side effect is idempotent, so concurrent clients and retried
//! calls converge instead of corrupting balances.
//!
//! `now` is taken as a parameter at this boundary; nothing below it reads
//! the clock.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod spin;
pub mod vouchers;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use ledger::{AttemptGrant, EntitlementLedger};
pub use lifecycle::{NewOrder, OrderService};
pub use spin::{SpinEngine, SpinOutcome};
pub use vouchers::VoucherService;
