//! # Cart Repository
//!
//! One cart document per user, keyed by user id. Lines are unique by
//! product id; price and name are frozen into the line when it is added
//! (snapshot pattern), so the cart renders stably even if the product
//! record changes underneath it.
//!
//! The cart is a single-owner record (only the owning user's devices write
//! it), so plain writes are acceptable here; clearing on checkout is one
//! `set` of an empty document, which is as atomic as the store gets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use velo_core::types::CartLine;

use crate::error::StoreResult;
use crate::record::{collections, RecordStore};

use super::{decode, encode};

/// The stored cart document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CartDocument {
    lines: Vec<CartLine>,
    updated_at: DateTime<Utc>,
}

/// Repository for per-user cart documents.
#[derive(Clone)]
pub struct CartRepository {
    store: Arc<dyn RecordStore>,
}

impl CartRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        CartRepository { store }
    }

    async fn load(&self, user_id: &str) -> StoreResult<Option<CartDocument>> {
        match self.store.get(collections::CARTS, user_id).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &str, doc: &CartDocument) -> StoreResult<()> {
        self.store.set(collections::CARTS, user_id, encode(doc)?).await
    }

    /// The user's current cart lines; an absent document is an empty cart.
    pub async fn get_lines(&self, user_id: &str) -> StoreResult<Vec<CartLine>> {
        Ok(self.load(user_id).await?.map(|doc| doc.lines).unwrap_or_default())
    }

    /// Inserts a line, or replaces the existing line for the same product
    /// (quantity changes and voucher application both come through here).
    pub async fn put_line(
        &self,
        user_id: &str,
        line: CartLine,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut lines = self.get_lines(user_id).await?;
        match lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => lines.push(line),
        }
        debug!(user_id, count = lines.len(), "cart line upserted");
        self.save(user_id, &CartDocument { lines, updated_at: now }).await
    }

    /// Removes the line for a product, if present.
    pub async fn remove_line(
        &self,
        user_id: &str,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut lines = self.get_lines(user_id).await?;
        lines.retain(|l| l.product_id != product_id);
        self.save(user_id, &CartDocument { lines, updated_at: now }).await
    }

    /// Empties the cart. Called once per successful order creation.
    pub async fn clear(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<()> {
        debug!(user_id, "clearing cart");
        self.save(
            user_id,
            &CartDocument {
                lines: Vec::new(),
                updated_at: now,
            },
        )
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

    fn line(product_id: &str, price: i64, qty: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: format!("Part {}", product_id),
            unit_price_cents: price,
            quantity: qty,
            voucher: None,
        }
    }

    #[tokio::test]
    async fn test_empty_cart_by_default() {
        let carts = Database::in_memory().carts();
        assert!(carts.get_lines("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_line_replaces_same_product() {
        let carts = Database::in_memory().carts();
        carts.put_line("u1", line("p1", 1000, 1), Utc::now()).await.unwrap();
        carts.put_line("u1", line("p2", 500, 2), Utc::now()).await.unwrap();
        carts.put_line("u1", line("p1", 1000, 3), Utc::now()).await.unwrap();

        let lines = carts.get_lines("u1").await.unwrap();
        assert_eq!(lines.len(), 2);
        let p1 = lines.iter().find(|l| l.product_id == "p1").unwrap();
        assert_eq!(p1.quantity, 3);
    }

    #[tokio::test]
    async fn test_remove_line() {
        let carts = Database::in_memory().carts();
        carts.put_line("u1", line("p1", 1000, 1), Utc::now()).await.unwrap();
        carts.remove_line("u1", "p1", Utc::now()).await.unwrap();
        carts.remove_line("u1", "missing", Utc::now()).await.unwrap();
        assert!(carts.get_lines("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let carts = Database::in_memory().carts();
        carts.put_line("u1", line("p1", 1000, 1), Utc::now()).await.unwrap();
        carts.put_line("u1", line("p2", 500, 1), Utc::now()).await.unwrap();
        carts.clear("u1", Utc::now()).await.unwrap();
        assert!(carts.get_lines("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let carts = Database::in_memory().carts();
        carts.put_line("u1", line("p1", 1000, 1), Utc::now()).await.unwrap();
        assert!(carts.get_lines("u2").await.unwrap().is_empty());
    }
}
