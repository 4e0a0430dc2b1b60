//! # In-Memory Record Store
//!
//! Reference implementation of [`RecordStore`] and the test double for the
//! whole workspace. Documents live in a `HashMap` of collections guarded by
//! a single mutex; the guard is never held across an await, so the async
//! trait methods stay `Send`.
//!
//! Conditional updates (`update_if`) are evaluated atomically under the
//! lock, which gives this backend exactly the compare-and-swap semantics
//! the contract demands. Change events go out over a per-collection
//! broadcast channel.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{ChangeEvent, ChangeKind, JsonMap, RecordStore};

/// Capacity of each collection's change-event channel. Laggy subscribers
/// miss events rather than blocking writers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// collection name → (record id → document). BTreeMap keeps iteration
    /// (and query results) deterministic for tests.
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,

    /// collection name → change-event channel, created on first use.
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Sends a change event to subscribers of `collection`, if any.
    fn publish(&self, collection: &str, id: &str, kind: ChangeKind, record: Option<Value>) {
        let channels = self.channels.lock().expect("channel map poisoned");
        if let Some(sender) = channels.get(collection) {
            // A send error just means nobody is listening right now.
            let _ = sender.send(ChangeEvent {
                collection: collection.to_string(),
                id: id.to_string(),
                kind,
                record,
            });
        }
    }

    fn with_collections<R>(&self, f: impl FnOnce(&mut HashMap<String, BTreeMap<String, Value>>) -> R) -> R {
        let mut collections = self.collections.lock().expect("collection map poisoned");
        f(&mut collections)
    }
}

/// Merges `fields` into `record` at the top level.
fn merge_fields(record: &mut Value, fields: JsonMap) {
    if let Value::Object(map) = record {
        for (key, value) in fields {
            map.insert(key, value);
        }
    }
}

/// Whether `record` matches every expectation (missing fields compare as null).
fn matches_expected(record: &Value, expected: &JsonMap) -> bool {
    expected.iter().all(|(key, want)| {
        let have = record.get(key).unwrap_or(&Value::Null);
        have == want
    })
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self.with_collections(|c| {
            c.get(collection).and_then(|records| records.get(id)).cloned()
        }))
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> StoreResult<()> {
        self.with_collections(|c| {
            c.entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), value.clone());
        });
        debug!(collection, id, "record set");
        self.publish(collection, id, ChangeKind::Set, Some(value));
        Ok(())
    }

    async fn create(&self, collection: &str, id: &str, value: Value) -> StoreResult<bool> {
        let created = self.with_collections(|c| {
            let records = c.entry(collection.to_string()).or_default();
            if records.contains_key(id) {
                false
            } else {
                records.insert(id.to_string(), value.clone());
                true
            }
        });
        if created {
            debug!(collection, id, "record created");
            self.publish(collection, id, ChangeKind::Set, Some(value));
        }
        Ok(created)
    }

    async fn update(&self, collection: &str, id: &str, fields: JsonMap) -> StoreResult<()> {
        let updated = self.with_collections(|c| {
            let record = c.get_mut(collection).and_then(|records| records.get_mut(id));
            match record {
                Some(record) => {
                    merge_fields(record, fields);
                    Some(record.clone())
                }
                None => None,
            }
        });
        match updated {
            Some(record) => {
                debug!(collection, id, "record updated");
                self.publish(collection, id, ChangeKind::Updated, Some(record));
                Ok(())
            }
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &JsonMap,
        fields: JsonMap,
    ) -> StoreResult<bool> {
        // Check and merge happen under one lock acquisition: this is the
        // compare-and-swap the contract promises.
        let applied = self.with_collections(|c| {
            let record = c.get_mut(collection).and_then(|records| records.get_mut(id));
            match record {
                Some(record) if matches_expected(record, expected) => {
                    merge_fields(record, fields);
                    Some(record.clone())
                }
                _ => None,
            }
        });
        match applied {
            Some(record) => {
                debug!(collection, id, "conditional update applied");
                self.publish(collection, id, ChangeKind::Updated, Some(record));
                Ok(true)
            }
            None => {
                debug!(collection, id, "conditional update refused");
                Ok(false)
            }
        }
    }

    async fn remove(&self, collection: &str, id: &str) -> StoreResult<()> {
        let removed = self.with_collections(|c| {
            c.get_mut(collection)
                .and_then(|records| records.remove(id))
                .is_some()
        });
        if removed {
            debug!(collection, id, "record removed");
            self.publish(collection, id, ChangeKind::Removed, None);
        }
        Ok(())
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Value>> {
        Ok(self.with_collections(|c| {
            c.get(collection)
                .map(|records| {
                    records
                        .values()
                        .filter(|record| record.get(field) == Some(value))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        }))
    }

    async fn subscribe(&self, collection: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        let mut channels = self.channels.lock().expect("channel map poisoned");
        let sender = channels
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0);
        Ok(sender.subscribe())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store
            .set("vouchers", "v1", json!({"status": "available"}))
            .await
            .unwrap();

        let record = store.get("vouchers", "v1").await.unwrap().unwrap();
        assert_eq!(record["status"], "available");
        assert!(store.get("vouchers", "v2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_only_once() {
        let store = MemoryStore::new();
        assert!(store.create("users", "u1", json!({"n": 1})).await.unwrap());
        assert!(!store.create("users", "u1", json!({"n": 2})).await.unwrap());

        let record = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(record["n"], 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store
            .set("orders", "o1", json!({"status": "pending", "total": 100}))
            .await
            .unwrap();
        store
            .update("orders", "o1", fields(json!({"status": "paid"})))
            .await
            .unwrap();

        let record = store.get("orders", "o1").await.unwrap().unwrap();
        assert_eq!(record["status"], "paid");
        assert_eq!(record["total"], 100);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let store = MemoryStore::new();
        let err = store
            .update("orders", "nope", fields(json!({"status": "paid"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_if_applies_only_on_match() {
        let store = MemoryStore::new();
        store
            .set("vouchers", "v1", json!({"status": "available"}))
            .await
            .unwrap();

        let expected = fields(json!({"status": "available"}));
        let applied = store
            .update_if("vouchers", "v1", &expected, fields(json!({"status": "reserved"})))
            .await
            .unwrap();
        assert!(applied);

        // Same expectation no longer holds: second swap must refuse
        let applied = store
            .update_if("vouchers", "v1", &expected, fields(json!({"status": "reserved"})))
            .await
            .unwrap();
        assert!(!applied);

        let record = store.get("vouchers", "v1").await.unwrap().unwrap();
        assert_eq!(record["status"], "reserved");
    }

    #[tokio::test]
    async fn test_update_if_absent_record_never_matches() {
        let store = MemoryStore::new();
        let applied = store
            .update_if(
                "vouchers",
                "ghost",
                &fields(json!({"status": "available"})),
                fields(json!({"status": "reserved"})),
            )
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_query_by_field() {
        let store = MemoryStore::new();
        store
            .set("vouchers", "v1", json!({"user_id": "u1", "code": "A"}))
            .await
            .unwrap();
        store
            .set("vouchers", "v2", json!({"user_id": "u2", "code": "B"}))
            .await
            .unwrap();
        store
            .set("vouchers", "v3", json!({"user_id": "u1", "code": "C"}))
            .await
            .unwrap();

        let mine = store
            .query_by_field("vouchers", "user_id", &json!("u1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.set("vouchers", "v1", json!({})).await.unwrap();
        store.remove("vouchers", "v1").await.unwrap();
        store.remove("vouchers", "v1").await.unwrap();
        assert!(store.get("vouchers", "v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let store = MemoryStore::new();
        let mut events = store.subscribe("orders").await.unwrap();

        store.set("orders", "o1", json!({"status": "pending"})).await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.id, "o1");
        assert_eq!(event.kind, ChangeKind::Set);

        store.remove("orders", "o1").await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Removed);
        assert!(event.record.is_none());
    }
}
