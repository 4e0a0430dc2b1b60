//! # Record Store Contract
//!
//! The interface the hosted document store is consumed through. Every core
//! component depends only on these operations plus a monotonic clock; no
//! backend type leaks past this trait.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      RecordStore Operations                             │
//! │                                                                         │
//! │  get(collection, id)                → Option<document>                  │
//! │  set(collection, id, doc)           → unconditional write               │
//! │  create(collection, id, doc)        → write iff absent                  │
//! │  update(collection, id, fields)     → shallow field merge               │
//! │  update_if(collection, id,                                              │
//! │            expected, fields)        → COMPARE-AND-SWAP field merge      │
//! │  remove(collection, id)             → delete                            │
//! │  query_by_field(collection, f, v)   → matching documents                │
//! │  subscribe(collection)              → change-event receiver             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `update_if` is the concurrency primitive everything contended is built
//! on: the write applies only if every named field still holds its expected
//! value, and the caller learns whether it applied. Real backends map it to
//! their native conditional write (or a version field); [`crate::memory`]
//! implements it under a single lock.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StoreResult;

/// Shallow field map used for updates and expectations.
pub type JsonMap = serde_json::Map<String, Value>;

// =============================================================================
// Collections
// =============================================================================

/// Names of the collections the shop persists.
pub mod collections {
    pub const USERS: &str = "users";
    pub const VOUCHERS: &str = "vouchers";
    pub const ORDERS: &str = "orders";
    pub const CARTS: &str = "carts";
    pub const CONFIG: &str = "config";
}

// =============================================================================
// Change Events
// =============================================================================

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Updated,
    Removed,
}

/// A change notification, delivered to subscribers.
///
/// The presentation layer uses these for real-time sync (cart badges,
/// admin order lists). The engine itself never depends on them.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
    /// The record after the change; `None` for removals.
    pub record: Option<Value>,
}

// =============================================================================
// RecordStore Trait
// =============================================================================

/// The document store, as consumed by the repositories.
///
/// Every method is an async suspension point: between any read and the
/// matching write another client may have mutated the record. Use
/// [`RecordStore::update_if`] for anything contended.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches a record, or `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Writes a record unconditionally, creating or replacing it.
    async fn set(&self, collection: &str, id: &str, value: Value) -> StoreResult<()>;

    /// Writes a record only if no record with this id exists yet.
    ///
    /// Returns whether the write applied. Closes the create race two
    /// writers hit when both observe an absent record.
    async fn create(&self, collection: &str, id: &str, value: Value) -> StoreResult<bool>;

    /// Merges `fields` into an existing record (shallow, top-level keys).
    ///
    /// Fails with `NotFound` if the record is absent.
    async fn update(&self, collection: &str, id: &str, fields: JsonMap) -> StoreResult<()>;

    /// Conditional update: merges `fields` iff every field named in
    /// `expected` still holds its expected value (a missing field compares
    /// as JSON null). Returns whether the write applied; an absent record
    /// never matches.
    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &JsonMap,
        fields: JsonMap,
    ) -> StoreResult<bool>;

    /// Deletes a record. Deleting an absent record is a no-op.
    async fn remove(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// All records whose top-level `field` equals `value`.
    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Value>>;

    /// Subscribes to change events for a collection.
    async fn subscribe(&self, collection: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>>;
}
