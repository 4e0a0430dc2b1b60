//! # Order Repository
//!
//! Order records and their guarded status transitions.
//!
//! ## Transition writes
//! ```text
//! try_mark_paid        pending → paid         (CAS on status == "pending")
//! try_mark_cancelled   pending → cancelled    (CAS on status == "pending")
//! try_mark_rewarded    paid, rewarded=false → rewarded=true
//! try_mark_rated       paid, is_rated=false → is_rated=true
//! ```
//! The expected-status check makes terminal states sticky under races: if
//! two admins approve and cancel the same pending order simultaneously,
//! exactly one swap applies and the other is refused. Last-write-wins is
//! never acceptable here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use velo_core::types::{Order, OrderStatus, PaymentMethod};

use crate::error::StoreResult;
use crate::record::{collections, RecordStore};

use super::{decode, encode, object};

/// Repository for order records.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn RecordStore>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        OrderRepository { store }
    }

    /// Inserts a newly created order.
    pub async fn insert(&self, order: &Order) -> StoreResult<()> {
        debug!(order_id = %order.id, user_id = %order.user_id, total = order.total_cents, "inserting order");
        self.store
            .set(collections::ORDERS, &order.id, encode(order)?)
            .await
    }

    /// Fetches an order by id.
    pub async fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        match self.store.get(collections::ORDERS, order_id).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// All orders placed by a user (order history view).
    pub async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let records = self
            .store
            .query_by_field(collections::ORDERS, "user_id", &Value::String(user_id.to_string()))
            .await?;
        records.into_iter().map(decode).collect()
    }

    /// Attempts the pending → paid transition.
    pub async fn try_mark_paid(
        &self,
        order_id: &str,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let expected = object(json!({ "status": OrderStatus::Pending.as_str() }));
        let fields = object(json!({
            "status": OrderStatus::Paid.as_str(),
            "payment_method": payment_method,
            "completed_at": now,
            "updated_at": now,
        }));
        let applied = self
            .store
            .update_if(collections::ORDERS, order_id, &expected, fields)
            .await?;
        debug!(order_id, applied, "order approve attempt");
        Ok(applied)
    }

    /// Attempts the pending → cancelled transition, storing the reason.
    pub async fn try_mark_cancelled(
        &self,
        order_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let expected = object(json!({ "status": OrderStatus::Pending.as_str() }));
        let fields = object(json!({
            "status": OrderStatus::Cancelled.as_str(),
            "cancel_reason": reason,
            "cancelled_at": now,
            "updated_at": now,
        }));
        let applied = self
            .store
            .update_if(collections::ORDERS, order_id, &expected, fields)
            .await?;
        debug!(order_id, applied, "order cancel attempt");
        Ok(applied)
    }

    /// Records that the spin-attempt grant for this order has been applied.
    ///
    /// Conditional on the order being paid and not yet rewarded, so a
    /// retried approval can never grant twice.
    pub async fn try_mark_rewarded(&self, order_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let expected = object(json!({
            "status": OrderStatus::Paid.as_str(),
            "rewarded": false,
        }));
        let fields = object(json!({
            "rewarded": true,
            "updated_at": now,
        }));
        self.store
            .update_if(collections::ORDERS, order_id, &expected, fields)
            .await
    }

    /// Records the customer's rating flag on a paid order.
    ///
    /// The only mutation allowed after an order reaches a terminal state.
    pub async fn try_mark_rated(&self, order_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let expected = object(json!({
            "status": OrderStatus::Paid.as_str(),
            "is_rated": false,
        }));
        let fields = object(json!({
            "is_rated": true,
            "updated_at": now,
        }));
        self.store
            .update_if(collections::ORDERS, order_id, &expected, fields)
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn order(id: &str, user_id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            lines: vec![],
            subtotal_cents: 1000,
            discount_cents: 0,
            total_cents: 1000,
            payment_method: PaymentMethod::Card,
            notes: None,
            cancel_reason: None,
            is_rated: false,
            rewarded: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();

        let loaded = orders.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Pending);
        assert_eq!(loaded.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_approve_vs_cancel_race_one_winner() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();

        let approved = orders
            .try_mark_paid("o1", PaymentMethod::Cash, Utc::now())
            .await
            .unwrap();
        let cancelled = orders
            .try_mark_cancelled("o1", "changed mind", Utc::now())
            .await
            .unwrap();

        assert!(approved);
        assert!(!cancelled);

        let loaded = orders.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Paid);
        assert_eq!(loaded.payment_method, PaymentMethod::Cash);
        assert!(loaded.completed_at.is_some());
        assert!(loaded.cancel_reason.is_none());
    }

    #[tokio::test]
    async fn test_cancel_stores_reason() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();

        assert!(orders
            .try_mark_cancelled("o1", "out of stock", Utc::now())
            .await
            .unwrap());

        let loaded = orders.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Cancelled);
        assert_eq!(loaded.cancel_reason.as_deref(), Some("out of stock"));
        assert!(loaded.cancelled_at.is_some());

        // Terminal: approving afterwards is refused
        assert!(!orders
            .try_mark_paid("o1", PaymentMethod::Cash, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rewarded_applies_once_and_only_when_paid() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();

        // Still pending: refused
        assert!(!orders.try_mark_rewarded("o1", Utc::now()).await.unwrap());

        orders
            .try_mark_paid("o1", PaymentMethod::Card, Utc::now())
            .await
            .unwrap();
        assert!(orders.try_mark_rewarded("o1", Utc::now()).await.unwrap());
        // Second application refused: the grant is recorded
        assert!(!orders.try_mark_rewarded("o1", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_rated_only_on_paid_orders() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();

        assert!(!orders.try_mark_rated("o1", Utc::now()).await.unwrap());

        orders
            .try_mark_paid("o1", PaymentMethod::Card, Utc::now())
            .await
            .unwrap();
        assert!(orders.try_mark_rated("o1", Utc::now()).await.unwrap());
        assert!(!orders.try_mark_rated("o1", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_user() {
        let orders = Database::in_memory().orders();
        orders.insert(&order("o1", "u1")).await.unwrap();
        orders.insert(&order("o2", "u2")).await.unwrap();
        orders.insert(&order("o3", "u1")).await.unwrap();

        assert_eq!(orders.list_by_user("u1").await.unwrap().len(), 2);
    }
}
