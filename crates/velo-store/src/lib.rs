//! # velo-store: Record-Store Layer for Velo POS
//!
//! This crate provides data access for the Velo bicycle shop. The hosted
//! backend is a real-time document store; everything here goes through the
//! [`RecordStore`] trait so the engine never sees a concrete backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Velo POS Data Flow                               │
//! │                                                                         │
//! │  velo-engine (ledger, spin, order lifecycle)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    velo-store (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │ RecordStore  │    │    │
//! │  │   │   (db.rs)     │───►│ user/voucher/ │───►│ trait +      │    │    │
//! │  │   │   facade      │    │ order/cart/   │    │ MemoryStore  │    │    │
//! │  │   └───────────────┘    │ config        │    └──────────────┘    │    │
//! │  │                        └───────────────┘                        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Hosted document store (users, vouchers, orders, carts, config)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency discipline
//!
//! The store offers no cross-record transactions. Another client may mutate
//! any record between a read and the matching write, so every contended
//! mutation is a conditional update ([`RecordStore::update_if`]): the write
//! names the field values it expects and applies only if they still hold.
//! Voucher reservation, order status transitions, and user balance changes
//! all use this primitive; a lost race is reported to the caller, never
//! papered over with a blind overwrite.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod db;
pub mod error;
pub mod memory;
pub mod record;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use record::{collections, ChangeEvent, ChangeKind, JsonMap, RecordStore};

pub use repository::cart::CartRepository;
pub use repository::config::WheelConfigRepository;
pub use repository::order::OrderRepository;
pub use repository::user::UserRepository;
pub use repository::voucher::VoucherRepository;
