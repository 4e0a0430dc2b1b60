//! # User Repository
//!
//! Profile records and the two contended balance mutations: crediting a
//! paid order (spend + optional attempt grant) and spending a spin attempt.
//!
//! ## Balance mutations
//! Both are read-modify-write loops guarded by a conditional update on the
//! current balance values. Another client spinning or paying from a second
//! device makes the expectation stale; the loop re-reads and retries, so
//! increments are never lost and an attempt can never be spent twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use velo_core::types::{AccountStatus, UserProfile, UserRole};

use crate::error::{StoreError, StoreResult};
use crate::record::{collections, RecordStore};

use super::{decode, encode, object, MAX_CAS_RETRIES};

/// Repository for user profile records.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn RecordStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        UserRepository { store }
    }

    /// Inserts a profile, replacing any existing record.
    pub async fn insert(&self, profile: &UserProfile) -> StoreResult<()> {
        debug!(user_id = %profile.id, "inserting user profile");
        self.store
            .set(collections::USERS, &profile.id, encode(profile)?)
            .await
    }

    /// Fetches a profile by user id.
    pub async fn get(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        match self.store.get(collections::USERS, user_id).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// Fetches a profile, creating a zeroed customer profile if absent.
    ///
    /// Paid orders may land before the profile document exists (the
    /// identity provider owns signup); a missing profile is treated as
    /// zero balances rather than a hard failure. `create` is conditional,
    /// so a concurrent writer's profile is never clobbered.
    pub async fn ensure(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<UserProfile> {
        if let Some(profile) = self.get(user_id).await? {
            return Ok(profile);
        }
        let fresh = UserProfile::new(user_id, UserRole::Customer, now);
        if self.store.create(collections::USERS, user_id, encode(&fresh)?).await? {
            debug!(user_id, "created late user profile");
            return Ok(fresh);
        }
        // Lost the create race; the winner's record is authoritative.
        self.get(user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", user_id))
    }

    /// Records a paid order against the profile: adds `amount_cents` to
    /// cumulative spend and, when `grant_attempt` is set, one spin attempt.
    ///
    /// Returns `(new_attempt_balance, new_total_spent_cents)`.
    pub async fn credit_paid_order(
        &self,
        user_id: &str,
        amount_cents: i64,
        grant_attempt: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<(i64, i64)> {
        // Spend is monotonically non-decreasing: a malformed negative
        // amount must not shrink it.
        let amount_cents = amount_cents.max(0);

        for _ in 0..MAX_CAS_RETRIES {
            let profile = self.ensure(user_id, now).await?;
            let new_balance = profile.spin_attempts + i64::from(grant_attempt);
            let new_total = profile.total_spent_cents + amount_cents;

            let expected = object(json!({
                "spin_attempts": profile.spin_attempts,
                "total_spent_cents": profile.total_spent_cents,
            }));
            let fields = object(json!({
                "spin_attempts": new_balance,
                "total_spent_cents": new_total,
                "updated_at": now,
            }));

            if self
                .store
                .update_if(collections::USERS, user_id, &expected, fields)
                .await?
            {
                debug!(user_id, new_balance, new_total, "credited paid order");
                return Ok((new_balance, new_total));
            }
        }

        Err(StoreError::Backend(format!(
            "user record {user_id} too contended to credit"
        )))
    }

    /// Spends one spin attempt.
    ///
    /// Returns the remaining balance, or `None` when the balance is
    /// already zero (or no profile exists). The decrement is conditional
    /// on the balance the caller observed, so two devices spinning on the
    /// same last attempt resolve to exactly one winner.
    pub async fn spend_attempt(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<i64>> {
        for _ in 0..MAX_CAS_RETRIES {
            let Some(profile) = self.get(user_id).await? else {
                return Ok(None);
            };
            if profile.spin_attempts <= 0 {
                return Ok(None);
            }

            let remaining = profile.spin_attempts - 1;
            let expected = object(json!({ "spin_attempts": profile.spin_attempts }));
            let fields = object(json!({
                "spin_attempts": remaining,
                "last_spin_at": now,
                "updated_at": now,
            }));

            if self
                .store
                .update_if(collections::USERS, user_id, &expected, fields)
                .await?
            {
                debug!(user_id, remaining, "spent spin attempt");
                return Ok(Some(remaining));
            }
        }

        Err(StoreError::Backend(format!(
            "user record {user_id} too contended to spend attempt"
        )))
    }

    /// Admin action: enables or disables an account.
    pub async fn set_account_status(
        &self,
        user_id: &str,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let fields = object(json!({
            "account_status": status,
            "updated_at": now,
        }));
        self.store.update(collections::USERS, user_id, fields).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn repo() -> UserRepository {
        Database::in_memory().users()
    }

    #[tokio::test]
    async fn test_ensure_creates_zeroed_profile() {
        let users = repo();
        let profile = users.ensure("u1", Utc::now()).await.unwrap();
        assert_eq!(profile.spin_attempts, 0);
        assert_eq!(profile.total_spent_cents, 0);
        assert_eq!(profile.role, UserRole::Customer);

        // Second ensure returns the same record, not a reset one
        users.credit_paid_order("u1", 500, false, Utc::now()).await.unwrap();
        let again = users.ensure("u1", Utc::now()).await.unwrap();
        assert_eq!(again.total_spent_cents, 500);
    }

    #[tokio::test]
    async fn test_credit_with_and_without_grant() {
        let users = repo();
        let (balance, total) = users
            .credit_paid_order("u1", 150_000, true, Utc::now())
            .await
            .unwrap();
        assert_eq!(balance, 1);
        assert_eq!(total, 150_000);

        let (balance, total) = users
            .credit_paid_order("u1", 20_000, false, Utc::now())
            .await
            .unwrap();
        assert_eq!(balance, 1);
        assert_eq!(total, 170_000);
    }

    #[tokio::test]
    async fn test_negative_amount_cannot_shrink_spend() {
        let users = repo();
        users.credit_paid_order("u1", 1000, false, Utc::now()).await.unwrap();
        let (_, total) = users
            .credit_paid_order("u1", -400, false, Utc::now())
            .await
            .unwrap();
        assert_eq!(total, 1000);
    }

    #[tokio::test]
    async fn test_spend_attempt_down_to_zero() {
        let users = repo();
        users.credit_paid_order("u1", 0, true, Utc::now()).await.unwrap();

        let remaining = users.spend_attempt("u1", Utc::now()).await.unwrap();
        assert_eq!(remaining, Some(0));

        // Balance exhausted: further spends refuse
        let remaining = users.spend_attempt("u1", Utc::now()).await.unwrap();
        assert_eq!(remaining, None);
    }

    #[tokio::test]
    async fn test_spend_attempt_without_profile() {
        let users = repo();
        assert_eq!(users.spend_attempt("ghost", Utc::now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_spend_records_last_spin_at() {
        let users = repo();
        users.credit_paid_order("u1", 0, true, Utc::now()).await.unwrap();
        users.spend_attempt("u1", Utc::now()).await.unwrap();

        let profile = users.get("u1").await.unwrap().unwrap();
        assert!(profile.last_spin_at.is_some());
    }

    #[tokio::test]
    async fn test_set_account_status() {
        let users = repo();
        users.ensure("u1", Utc::now()).await.unwrap();
        users
            .set_account_status("u1", AccountStatus::Disabled, Utc::now())
            .await
            .unwrap();

        let profile = users.get("u1").await.unwrap().unwrap();
        assert_eq!(profile.account_status, AccountStatus::Disabled);
    }
}
