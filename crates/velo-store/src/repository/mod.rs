//! # Repository Implementations
//!
//! One repository per collection, all built on the [`RecordStore`] trait.
//! Repositories translate between domain types and JSON documents and own
//! the conditional-update (compare-and-swap) calls for their collection;
//! business decisions about *when* to transition live in velo-engine.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreResult;
use crate::record::JsonMap;

pub mod cart;
pub mod config;
pub mod order;
pub mod user;
pub mod voucher;

/// How often a read-modify-write loop retries a contended record before
/// giving up. Contention on a single user or voucher record is rare; a
/// loop that spins this long indicates a backend problem.
pub(crate) const MAX_CAS_RETRIES: usize = 8;

/// Serializes a domain value into a store document.
pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a store document into a domain value.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> StoreResult<T> {
    Ok(serde_json::from_value(value)?)
}

/// Unwraps a `json!({...})` literal into a field map.
pub(crate) fn object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}
