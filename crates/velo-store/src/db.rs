//! # Database Facade
//!
//! Hands out per-collection repositories over a shared [`RecordStore`],
//! so callers write `db.vouchers().try_reserve(...)` instead of threading
//! the store handle everywhere.

use std::sync::Arc;

use crate::memory::MemoryStore;
use crate::record::RecordStore;
use crate::repository::cart::CartRepository;
use crate::repository::config::WheelConfigRepository;
use crate::repository::order::OrderRepository;
use crate::repository::user::UserRepository;
use crate::repository::voucher::VoucherRepository;

/// Entry point to the data layer.
///
/// Cheap to clone; repositories share the underlying store handle.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn RecordStore>,
}

impl Database {
    /// Wraps an existing record-store backend.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Database { store }
    }

    /// Creates a database over a fresh in-memory backend.
    ///
    /// The reference configuration for tests and local development.
    pub fn in_memory() -> Self {
        Database::new(Arc::new(MemoryStore::new()))
    }

    /// The raw store handle, for subscriptions.
    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.store))
    }

    pub fn vouchers(&self) -> VoucherRepository {
        VoucherRepository::new(Arc::clone(&self.store))
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(Arc::clone(&self.store))
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(Arc::clone(&self.store))
    }

    pub fn wheel_config(&self) -> WheelConfigRepository {
        WheelConfigRepository::new(Arc::clone(&self.store))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
