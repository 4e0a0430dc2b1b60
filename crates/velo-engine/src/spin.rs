//! # Spin Engine
//!
//! The spin-wheel promotion: spending an attempt, rolling a segment, and
//! minting a voucher on a win.
//!
//! ## Spin Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One Spin                                        │
//! │                                                                         │
//! │  1. load wheel config                                                   │
//! │  2. spend one attempt (conditional decrement; refuses at zero)          │
//! │  3. uniform roll over the segment list                                  │
//! │  4. discount > 0?  ──no──►  outcome: no win, attempt still spent        │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  5. mint voucher: UUID id, 8-char display code, 30-day expiry,          │
//! │     status available                                                    │
//! │                                                                         │
//! │  The decrement comes BEFORE the roll: two devices racing on one         │
//! │  remaining attempt resolve at step 2, and a no-win roll never refunds.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Odds are controlled by the admin repeating segments in the config, not by
//! per-segment weights. Selection here is uniform on purpose.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use velo_core::error::{CoreError, ValidationError};
use velo_core::types::{WheelConfig, WheelSegment};
use velo_core::validation::validate_wheel_config;
use velo_core::voucher::{Voucher, VoucherStatus};
use velo_core::{VOUCHER_CODE_CHARSET, VOUCHER_CODE_LENGTH, VOUCHER_VALIDITY_DAYS};
use velo_store::Database;

use crate::error::EngineResult;

/// What a single spin produced, for immediate storefront feedback.
#[derive(Debug, Clone, Serialize)]
pub struct SpinOutcome {
    /// The segment the wheel landed on.
    pub segment: WheelSegment,

    /// The voucher minted for a winning segment; `None` on a no-win slot.
    pub voucher: Option<Voucher>,

    /// Attempt balance after this spin.
    pub attempts_remaining: i64,
}

impl SpinOutcome {
    /// Whether this spin won a discount.
    #[inline]
    pub fn is_win(&self) -> bool {
        self.voucher.is_some()
    }
}

/// Runs the spin-wheel promotion.
#[derive(Clone)]
pub struct SpinEngine {
    db: Database,
}

impl SpinEngine {
    pub fn new(db: Database) -> Self {
        SpinEngine { db }
    }

    /// The current wheel configuration, for the storefront to render.
    pub async fn wheel(&self) -> EngineResult<WheelConfig> {
        Ok(self.db.wheel_config().get().await?)
    }

    /// Admin action: replaces the wheel configuration after validating it.
    pub async fn update_wheel(&self, config: WheelConfig) -> EngineResult<()> {
        validate_wheel_config(&config).map_err(CoreError::from)?;
        self.db.wheel_config().set(&config).await?;
        Ok(())
    }

    /// Spends one attempt and spins the wheel for `user_id`.
    ///
    /// Fails with [`CoreError::InsufficientAttempts`] when the balance is
    /// zero or no profile exists. The attempt is spent whether or not the
    /// roll wins; a no-win outcome is a real outcome.
    pub async fn spin(&self, user_id: &str, now: DateTime<Utc>) -> EngineResult<SpinOutcome> {
        let config = self.db.wheel_config().get().await?;
        if config.segments.is_empty() {
            // A stored config bypassing validation would make the roll
            // unrollable; refuse rather than panic.
            return Err(CoreError::Validation(ValidationError::Required {
                field: "segments".to_string(),
            })
            .into());
        }

        let Some(remaining) = self.db.users().spend_attempt(user_id, now).await? else {
            return Err(CoreError::InsufficientAttempts.into());
        };

        let roll = rand::thread_rng().gen_range(0..config.segments.len());
        self.land(user_id, &config, roll, remaining, now).await
    }

    /// Resolves a spin once the attempt is spent and the roll is fixed.
    async fn land(
        &self,
        user_id: &str,
        config: &WheelConfig,
        roll: usize,
        attempts_remaining: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<SpinOutcome> {
        let Some(segment) = config.segment_at(roll) else {
            return Err(CoreError::Validation(ValidationError::OutOfRange {
                field: "roll".to_string(),
                min: 0,
                max: config.segments.len() as i64 - 1,
            })
            .into());
        };

        if segment.discount_percent == 0 {
            debug!(user_id, segment = %segment.label, "spin landed on no-win slot");
            return Ok(SpinOutcome {
                segment: segment.clone(),
                voucher: None,
                attempts_remaining,
            });
        }

        let voucher = Voucher {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            code: generate_code(),
            discount_percent: segment.discount_percent,
            status: VoucherStatus::Available,
            order_id: None,
            created_at: now,
            expires_at: now + Duration::days(VOUCHER_VALIDITY_DAYS),
            consumed_at: None,
        };
        self.db.vouchers().insert(&voucher).await?;

        info!(
            user_id,
            voucher_id = %voucher.id,
            code = %voucher.code,
            percent = voucher.discount_percent,
            "spin won a voucher"
        );

        Ok(SpinOutcome {
            segment: segment.clone(),
            voucher: Some(voucher),
            attempts_remaining,
        })
    }
}

/// Random 8-char display code over `[A-Z0-9]`.
///
/// Best-effort unique only; the UUID id is the real key and a collision in
/// the 36^8 space is cosmetic.
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..VOUCHER_CODE_LENGTH)
        .map(|_| VOUCHER_CODE_CHARSET[rng.gen_range(0..VOUCHER_CODE_CHARSET.len())] as char)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    async fn engine_with_attempts(user_id: &str, attempts: i64) -> (Database, SpinEngine) {
        let db = Database::in_memory();
        for _ in 0..attempts {
            db.users()
                .credit_paid_order(user_id, 0, true, Utc::now())
                .await
                .unwrap();
        }
        let engine = SpinEngine::new(db.clone());
        (db, engine)
    }

    fn winning_roll(config: &WheelConfig) -> usize {
        config
            .segments
            .iter()
            .position(|s| s.discount_percent == 10)
            .unwrap()
    }

    fn losing_roll(config: &WheelConfig) -> usize {
        config
            .segments
            .iter()
            .position(|s| s.discount_percent == 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_spin_without_attempts_refused() {
        let (_, engine) = engine_with_attempts("u1", 0).await;
        let err = engine.spin("u1", Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientAttempts)
        ));
    }

    #[tokio::test]
    async fn test_spin_spends_exactly_one_attempt() {
        let (db, engine) = engine_with_attempts("u1", 2).await;

        let outcome = engine.spin("u1", Utc::now()).await.unwrap();
        assert_eq!(outcome.attempts_remaining, 1);

        let profile = db.users().get("u1").await.unwrap().unwrap();
        assert_eq!(profile.spin_attempts, 1);
        assert!(profile.last_spin_at.is_some());
    }

    #[tokio::test]
    async fn test_winning_roll_mints_available_voucher() {
        let (db, engine) = engine_with_attempts("u1", 1).await;
        let config = WheelConfig::default();
        let now = Utc::now();

        let outcome = engine
            .land("u1", &config, winning_roll(&config), 0, now)
            .await
            .unwrap();
        assert!(outcome.is_win());

        let voucher = outcome.voucher.unwrap();
        assert_eq!(voucher.discount_percent, 10);
        assert_eq!(voucher.status, VoucherStatus::Available);
        assert_eq!(voucher.user_id, "u1");
        assert_eq!(voucher.code.len(), VOUCHER_CODE_LENGTH);
        assert!(voucher
            .code
            .bytes()
            .all(|b| VOUCHER_CODE_CHARSET.contains(&b)));
        assert_eq!(voucher.expires_at, now + Duration::days(VOUCHER_VALIDITY_DAYS));

        // Persisted, not just returned
        let stored = db.vouchers().get(&voucher.id).await.unwrap().unwrap();
        assert_eq!(stored.code, voucher.code);
    }

    #[tokio::test]
    async fn test_no_win_mints_nothing_and_keeps_attempt_spent() {
        let (db, engine) = engine_with_attempts("u1", 1).await;
        let config = WheelConfig::default();

        // Spend the attempt the way spin() would, then land on a no-win slot
        let remaining = db.users().spend_attempt("u1", Utc::now()).await.unwrap().unwrap();
        let outcome = engine
            .land("u1", &config, losing_roll(&config), remaining, Utc::now())
            .await
            .unwrap();

        assert!(!outcome.is_win());
        assert_eq!(outcome.attempts_remaining, 0);
        assert!(db.vouchers().list_by_user("u1").await.unwrap().is_empty());
        // No refund
        assert_eq!(db.users().get("u1").await.unwrap().unwrap().spin_attempts, 0);
    }

    #[tokio::test]
    async fn test_spin_outcome_matches_a_configured_segment() {
        let (db, engine) = engine_with_attempts("u1", 1).await;
        let config = WheelConfig::default();

        let outcome = engine.spin("u1", Utc::now()).await.unwrap();
        assert!(config.segments.contains(&outcome.segment));
        // Win iff the landed segment has a discount
        assert_eq!(outcome.is_win(), outcome.segment.discount_percent > 0);
        if let Some(voucher) = &outcome.voucher {
            assert_eq!(voucher.discount_percent, outcome.segment.discount_percent);
        }
        let minted = db.vouchers().list_by_user("u1").await.unwrap().len();
        assert_eq!(minted, usize::from(outcome.is_win()));
    }

    #[tokio::test]
    async fn test_update_wheel_validates() {
        let engine = SpinEngine::new(Database::in_memory());

        let empty = WheelConfig {
            segments: vec![],
            min_order_cents: 0,
        };
        assert!(engine.update_wheel(empty).await.is_err());

        let mut custom = WheelConfig::default();
        custom.min_order_cents = 50_000;
        engine.update_wheel(custom).await.unwrap();
        assert_eq!(engine.wheel().await.unwrap().min_order_cents, 50_000);
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), VOUCHER_CODE_LENGTH);
            assert!(code.bytes().all(|b| VOUCHER_CODE_CHARSET.contains(&b)));
        }
    }
}
