//! # Voucher Service
//!
//! Drives the voucher state machine against the record store.
//!
//! ## Operations
//! ```text
//! reserve          available → reserved    strict: refusals are errors,
//!                                          classified for the storefront
//! consume          reserved  → consumed    idempotent: already-consumed is
//!                                          success, anything odd is logged
//! release          reserved  → available   idempotent: same
//! purge_consumed   consumed  → (deleted)   cleanup of spent vouchers
//! ```
//!
//! Reserve is the customer-facing edge, so it reports exactly why it
//! refused (reserved / consumed / expired). Consume and release run inside
//! order transitions that may be retried or reconciled; they converge on
//! the desired end state instead of failing on re-application.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use velo_core::error::{CoreError, VoucherUnavailableReason};
use velo_core::voucher::{Voucher, VoucherStatus};
use velo_store::Database;

use crate::error::EngineResult;

/// Engine-level voucher operations.
#[derive(Clone)]
pub struct VoucherService {
    db: Database,
}

impl VoucherService {
    pub fn new(db: Database) -> Self {
        VoucherService { db }
    }

    /// All vouchers owned by a user, for the wallet view.
    pub async fn list_for_user(&self, user_id: &str) -> EngineResult<Vec<Voucher>> {
        Ok(self.db.vouchers().list_by_user(user_id).await?)
    }

    /// Vouchers the user could apply at checkout right now: available and
    /// unexpired.
    pub async fn usable_for_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Voucher>> {
        let mut vouchers = self.db.vouchers().list_by_user(user_id).await?;
        vouchers.retain(|v| v.is_usable(now));
        Ok(vouchers)
    }

    /// Reserves a voucher for a pending order.
    ///
    /// Strict by design: ownership, expiry, and current status are all
    /// checked, and a reservation lost to a concurrent order surfaces as
    /// [`CoreError::VoucherUnavailable`]. Expiry is judged here, lazily;
    /// there is no background sweep.
    pub async fn reserve(
        &self,
        voucher_id: &str,
        user_id: &str,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Voucher> {
        let voucher = self.require(voucher_id).await?;

        // Non-transferable. A foreign voucher reads as nonexistent.
        if voucher.user_id != user_id {
            return Err(CoreError::VoucherNotFound(voucher_id.to_string()).into());
        }

        voucher.ensure_reservable(now)?;

        if !self.db.vouchers().try_reserve(voucher_id, order_id, now).await? {
            // Read said available, write found otherwise: a concurrent
            // order won the swap in between.
            return Err(CoreError::VoucherUnavailable {
                voucher_id: voucher_id.to_string(),
                reason: VoucherUnavailableReason::AlreadyReserved,
            }
            .into());
        }

        info!(voucher_id, order_id, "voucher reserved");
        self.require(voucher_id).await
    }

    /// Consumes a reserved voucher. Idempotent: an already-consumed voucher
    /// is success, and unexpected states are logged and skipped so a
    /// retried approval still converges.
    pub async fn consume(&self, voucher_id: &str, now: DateTime<Utc>) -> EngineResult<()> {
        let Some(voucher) = self.db.vouchers().get(voucher_id).await? else {
            warn!(voucher_id, "consume skipped: voucher record missing");
            return Ok(());
        };

        match voucher.status {
            VoucherStatus::Reserved => {
                if self.db.vouchers().try_consume(voucher_id, now).await? {
                    info!(voucher_id, "voucher consumed");
                } else {
                    // Lost a race to another consume; the end state holds.
                    debug!(voucher_id, "consume raced, already applied");
                }
            }
            VoucherStatus::Consumed => {
                debug!(voucher_id, "consume skipped: already consumed");
            }
            VoucherStatus::Available => {
                // An order referencing an unreserved voucher means a prior
                // step was lost; do not consume what was never held.
                warn!(voucher_id, "consume skipped: voucher was not reserved");
            }
        }
        Ok(())
    }

    /// Releases a reserved voucher back to available. Idempotent: missing
    /// records and non-reserved states are logged and skipped. A consumed
    /// voucher is never released.
    pub async fn release(&self, voucher_id: &str, now: DateTime<Utc>) -> EngineResult<()> {
        if self.db.vouchers().try_release(voucher_id, now).await? {
            info!(voucher_id, "voucher released");
        } else {
            debug!(voucher_id, "release skipped: voucher not reserved");
        }
        Ok(())
    }

    /// Deletes a user's consumed vouchers and returns how many went.
    pub async fn purge_consumed(&self, user_id: &str) -> EngineResult<usize> {
        let vouchers = self.db.vouchers().list_by_user(user_id).await?;
        let mut purged = 0;
        for voucher in vouchers {
            if voucher.status == VoucherStatus::Consumed {
                self.db.vouchers().remove(&voucher.id).await?;
                purged += 1;
            }
        }
        if purged > 0 {
            info!(user_id, purged, "purged consumed vouchers");
        }
        Ok(purged)
    }

    async fn require(&self, voucher_id: &str) -> EngineResult<Voucher> {
        self.db
            .vouchers()
            .get(voucher_id)
            .await?
            .ok_or_else(|| CoreError::VoucherNotFound(voucher_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
