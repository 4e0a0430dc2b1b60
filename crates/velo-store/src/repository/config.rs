//! # Wheel Configuration Repository
//!
//! The spin wheel configuration is a singleton document, edited by admins
//! and read by the spin engine and the entitlement ledger. A shop that has
//! never customized its wheel runs on [`WheelConfig::default`].

use std::sync::Arc;

use tracing::debug;

use velo_core::types::WheelConfig;

use crate::error::StoreResult;
use crate::record::{collections, RecordStore};

use super::{decode, encode};

/// Record id of the singleton document within the `config` collection.
const WHEEL_CONFIG_ID: &str = "spin_wheel";

/// Repository for the spin-wheel configuration singleton.
#[derive(Clone)]
pub struct WheelConfigRepository {
    store: Arc<dyn RecordStore>,
}

impl WheelConfigRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        WheelConfigRepository { store }
    }

    /// The current wheel configuration, or the built-in default when the
    /// admin has never saved one.
    pub async fn get(&self) -> StoreResult<WheelConfig> {
        match self.store.get(collections::CONFIG, WHEEL_CONFIG_ID).await? {
            Some(value) => Ok(decode(value)?),
            None => Ok(WheelConfig::default()),
        }
    }

    /// Replaces the wheel configuration (admin action). Validation happens
    /// in the engine before this is called.
    pub async fn set(&self, config: &WheelConfig) -> StoreResult<()> {
        debug!(
            segments = config.segments.len(),
            min_order_cents = config.min_order_cents,
            "saving wheel configuration"
        );
        self.store
            .set(collections::CONFIG, WHEEL_CONFIG_ID, encode(config)?)
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

    #[tokio::test]
    async fn test_default_when_unset() {
        let config = Database::in_memory().wheel_config();
        let loaded = config.get().await.unwrap();
        assert_eq!(loaded, WheelConfig::default());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let repo = Database::in_memory().wheel_config();
        let mut custom = WheelConfig::default();
        custom.min_order_cents = 50_000;
        custom.segments.truncate(3);

        repo.set(&custom).await.unwrap();
        let loaded = repo.get().await.unwrap();
        assert_eq!(loaded.min_order_cents, 50_000);
        assert_eq!(loaded.segments.len(), 3);
    }
}
