//! # Entitlement Ledger
//!
//! Spin-attempt grants and cumulative spend, credited from paid orders.
//!
//! ## Grant Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Attempt Grant on Approval                            │
//! │                                                                         │
//! │  order pending → paid                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rewarded flag swap (paid, rewarded=false → rewarded=true)              │
//! │       │ refused: ledger already credited, nothing to do                 │
//! │       ▼                                                                 │
//! │  total_spent += order total                                             │
//! │  spin_attempts += 1   iff order total ≥ wheel min_order                 │
//! │                                                                         │
//! │  The threshold is judged on the POST-discount total: what the shop      │
//! │  actually collects, not the sticker subtotal.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rewarded-flag swap is the idempotency gate: a retried approval or a
//! reconcile pass finds the flag already set and skips the credit, so one
//! paid order can never grant two attempts or double-count its spend.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use velo_core::types::Order;
use velo_store::Database;

use crate::error::EngineResult;

/// What a single paid-order credit did to the user's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptGrant {
    /// 1 when the order met the wheel threshold, else 0.
    pub attempts_added: i64,
    /// Attempt balance after the credit.
    pub new_balance: i64,
    /// Cumulative spend after the credit.
    pub total_spent_cents: i64,
}

/// Credits paid orders against user profiles.
#[derive(Clone)]
pub struct EntitlementLedger {
    db: Database,
}

impl EntitlementLedger {
    pub fn new(db: Database) -> Self {
        EntitlementLedger { db }
    }

    /// Applies the ledger effects of a paid order, exactly once.
    ///
    /// Returns `None` when the order was already credited (or is not paid),
    /// which callers treat as success: the effects are in place.
    pub async fn credit_order(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<AttemptGrant>> {
        if !self.db.orders().try_mark_rewarded(&order.id, now).await? {
            return Ok(None);
        }

        let config = self.db.wheel_config().get().await?;
        let qualifies = order.total_cents >= config.min_order_cents;

        let (new_balance, total_spent_cents) = self
            .db
            .users()
            .credit_paid_order(&order.user_id, order.total_cents, qualifies, now)
            .await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total_cents,
            qualifies,
            new_balance,
            "credited paid order to ledger"
        );

        Ok(Some(AttemptGrant {
            attempts_added: i64::from(qualifies),
            new_balance,
            total_spent_cents,
        }))
    }

    /// The user's current spin attempt balance; no profile means zero.
    pub async fn balance(&self, user_id: &str) -> EngineResult<i64> {
        Ok(self
            .db
            .users()
            .get(user_id)
            .await?
            .map(|profile| profile.spin_attempts)
            .unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use velo_core::types::{Order, OrderStatus, PaymentMethod};
    use velo_store::Database;

    fn paid_order(id: &str, user_id: &str, total_cents: i64) -> Order {
        let now = Utc::now();
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Paid,
            lines: vec![],
            subtotal_cents: total_cents,
            discount_cents: 0,
            total_cents,
            payment_method: PaymentMethod::Card,
            notes: None,
            cancel_reason: None,
            is_rated: false,
            rewarded: false,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
            cancelled_at: None,
        }
    }

    async fn setup(order: &Order) -> (Database, EntitlementLedger) {
        let db = Database::in_memory();
        db.orders().insert(order).await.unwrap();
        let ledger = EntitlementLedger::new(db.clone());
        (db, ledger)
    }

    #[tokio::test]
    async fn test_grant_above_threshold() {
        // Default wheel threshold is 100_000 cents
        let order = paid_order("o1", "u1", 150_000);
        let (_, ledger) = setup(&order).await;

        let grant = ledger.credit_order(&order, Utc::now()).await.unwrap().unwrap();
        assert_eq!(grant.attempts_added, 1);
        assert_eq!(grant.new_balance, 1);
        assert_eq!(grant.total_spent_cents, 150_000);
    }

    #[tokio::test]
    async fn test_no_grant_below_threshold_but_spend_counts() {
        let order = paid_order("o1", "u1", 99_999);
        let (_, ledger) = setup(&order).await;

        let grant = ledger.credit_order(&order, Utc::now()).await.unwrap().unwrap();
        assert_eq!(grant.attempts_added, 0);
        assert_eq!(grant.new_balance, 0);
        assert_eq!(grant.total_spent_cents, 99_999);
    }

    #[tokio::test]
    async fn test_exact_threshold_qualifies() {
        let order = paid_order("o1", "u1", 100_000);
        let (_, ledger) = setup(&order).await;

        let grant = ledger.credit_order(&order, Utc::now()).await.unwrap().unwrap();
        assert_eq!(grant.attempts_added, 1);
    }

    #[tokio::test]
    async fn test_credit_is_idempotent() {
        let order = paid_order("o1", "u1", 150_000);
        let (db, ledger) = setup(&order).await;

        assert!(ledger.credit_order(&order, Utc::now()).await.unwrap().is_some());
        // Second application is a no-op, not a second grant
        assert!(ledger.credit_order(&order, Utc::now()).await.unwrap().is_none());
        assert_eq!(ledger.balance("u1").await.unwrap(), 1);

        let profile = db.users().get("u1").await.unwrap().unwrap();
        assert_eq!(profile.total_spent_cents, 150_000);
    }

    #[tokio::test]
    async fn test_pending_order_is_never_credited() {
        let mut order = paid_order("o1", "u1", 150_000);
        order.status = OrderStatus::Pending;
        let (_, ledger) = setup(&order).await;

        assert!(ledger.credit_order(&order, Utc::now()).await.unwrap().is_none());
        assert_eq!(ledger.balance("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_balance_without_profile_is_zero() {
        let ledger = EntitlementLedger::new(Database::in_memory());
        assert_eq!(ledger.balance("ghost").await.unwrap(), 0);
    }
}
