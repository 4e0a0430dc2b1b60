//! # Voucher Repository
//!
//! Voucher records and their guarded state transitions.
//!
//! ## Transition writes
//! ```text
//! try_reserve   available → reserved    (CAS on status == "available")
//! try_consume   reserved  → consumed    (CAS on status == "reserved")
//! try_release   reserved  → available   (CAS on status == "reserved")
//! ```
//! Each write names the status it expects, so two orders racing for the
//! same voucher (one user checking out from two devices) resolve to
//! exactly one reservation. A refused swap is reported as `false`; the
//! engine classifies it for the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use velo_core::voucher::{Voucher, VoucherStatus};

use crate::error::StoreResult;
use crate::record::{collections, RecordStore};

use super::{decode, encode, object};

/// Repository for voucher records.
#[derive(Clone)]
pub struct VoucherRepository {
    store: Arc<dyn RecordStore>,
}

impl VoucherRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        VoucherRepository { store }
    }

    /// Inserts a freshly minted voucher.
    pub async fn insert(&self, voucher: &Voucher) -> StoreResult<()> {
        debug!(voucher_id = %voucher.id, user_id = %voucher.user_id, "inserting voucher");
        self.store
            .set(collections::VOUCHERS, &voucher.id, encode(voucher)?)
            .await
    }

    /// Fetches a voucher by id.
    pub async fn get(&self, voucher_id: &str) -> StoreResult<Option<Voucher>> {
        match self.store.get(collections::VOUCHERS, voucher_id).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// All vouchers owned by a user.
    pub async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Voucher>> {
        let records = self
            .store
            .query_by_field(collections::VOUCHERS, "user_id", &Value::String(user_id.to_string()))
            .await?;
        records.into_iter().map(decode).collect()
    }

    /// Attempts the available → reserved transition for `order_id`.
    ///
    /// Returns whether the reservation was won. A `false` means the status
    /// was no longer `available` at write time, however recently it was
    /// read as such.
    pub async fn try_reserve(
        &self,
        voucher_id: &str,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let expected = object(json!({ "status": VoucherStatus::Available.as_str() }));
        let fields = object(json!({
            "status": VoucherStatus::Reserved.as_str(),
            "order_id": order_id,
            "updated_at": now,
        }));
        let won = self
            .store
            .update_if(collections::VOUCHERS, voucher_id, &expected, fields)
            .await?;
        debug!(voucher_id, order_id, won, "voucher reservation attempt");
        Ok(won)
    }

    /// Attempts the reserved → consumed transition.
    pub async fn try_consume(&self, voucher_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let expected = object(json!({ "status": VoucherStatus::Reserved.as_str() }));
        let fields = object(json!({
            "status": VoucherStatus::Consumed.as_str(),
            "consumed_at": now,
        }));
        let applied = self
            .store
            .update_if(collections::VOUCHERS, voucher_id, &expected, fields)
            .await?;
        debug!(voucher_id, applied, "voucher consume attempt");
        Ok(applied)
    }

    /// Attempts the reserved → available transition, clearing the
    /// reservation pointer.
    ///
    /// Because the expectation names `reserved`, a consumed voucher can
    /// never be released by this call no matter how it is misused.
    pub async fn try_release(&self, voucher_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let expected = object(json!({ "status": VoucherStatus::Reserved.as_str() }));
        let fields = object(json!({
            "status": VoucherStatus::Available.as_str(),
            "order_id": Value::Null,
            "updated_at": now,
        }));
        let applied = self
            .store
            .update_if(collections::VOUCHERS, voucher_id, &expected, fields)
            .await?;
        debug!(voucher_id, applied, "voucher release attempt");
        Ok(applied)
    }

    /// Permanently deletes a voucher record.
    pub async fn remove(&self, voucher_id: &str) -> StoreResult<()> {
        debug!(voucher_id, "removing voucher");
        self.store.remove(collections::VOUCHERS, voucher_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
