//! # Order Lifecycle
//!
//! Checkout, approval, cancellation, and reconciliation of orders.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  cart ──create_order──► pending ──approve──► paid                       │
//! │   │     reserve all        │                  │ consume vouchers        │
//! │   │     vouchers, or       │                  │ credit ledger (once)    │
//! │   └──── roll back          │                  └──mark_rated (only       │
//! │         every one          │                     post-terminal write)   │
//! │                            │                                            │
//! │                         cancel(reason)                                  │
//! │                            │ release vouchers                           │
//! │                            ▼                                            │
//! │                        cancelled                                        │
//! │                                                                         │
//! │  Status transitions are conditional writes: a lost approve-vs-cancel    │
//! │  race surfaces as InvalidTransition, never a silent overwrite.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The side effects of a transition (voucher consumption, ledger credit,
//! voucher release) are keyed off the persisted status and individually
//! idempotent, so [`OrderService::reconcile`] can re-drive them after a
//! crash between the status write and its effects.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use velo_core::error::CoreError;
use velo_core::settlement::{ensure_unique_vouchers, settle, to_order_line};
use velo_core::types::{CartLine, Order, OrderStatus, PaymentMethod};
use velo_core::validation::{validate_cancel_reason, validate_quantity};
use velo_store::Database;

use crate::error::EngineResult;
use crate::ledger::EntitlementLedger;
use crate::vouchers::VoucherService;

/// Checkout parameters beyond the cart itself.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Drives orders through their lifecycle.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    ledger: EntitlementLedger,
    vouchers: VoucherService,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService {
            ledger: EntitlementLedger::new(db.clone()),
            vouchers: VoucherService::new(db.clone()),
            db,
        }
    }

    /// The voucher service sharing this service's store.
    pub fn vouchers(&self) -> &VoucherService {
        &self.vouchers
    }

    /// The entitlement ledger sharing this service's store.
    pub fn ledger(&self) -> &EntitlementLedger {
        &self.ledger
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The user's current cart.
    pub async fn cart(&self, user_id: &str) -> EngineResult<Vec<CartLine>> {
        Ok(self.db.carts().get_lines(user_id).await?)
    }

    /// Adds or replaces a cart line, validating quantity and any applied
    /// voucher (ownership, availability, expiry, one line per voucher).
    pub async fn put_cart_line(
        &self,
        user_id: &str,
        line: CartLine,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        validate_quantity(line.quantity).map_err(CoreError::from)?;

        if let Some(applied) = &line.voucher {
            let voucher = self
                .db
                .vouchers()
                .get(&applied.voucher_id)
                .await?
                .filter(|v| v.user_id == user_id)
                .ok_or_else(|| CoreError::VoucherNotFound(applied.voucher_id.clone()))?;
            voucher.ensure_reservable(now)?;
        }

        // Judge voucher uniqueness on the cart as it would look after the
        // upsert, not on the incoming line alone.
        let mut merged = self.db.carts().get_lines(user_id).await?;
        merged.retain(|l| l.product_id != line.product_id);
        merged.push(line.clone());
        ensure_unique_vouchers(&merged)?;

        Ok(self.db.carts().put_line(user_id, line, now).await?)
    }

    /// Removes a cart line.
    pub async fn remove_cart_line(
        &self,
        user_id: &str,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        Ok(self.db.carts().remove_line(user_id, product_id, now).await?)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Creates a pending order from the user's cart.
    ///
    /// Reserves every applied voucher before the order is written; if any
    /// reservation is refused, the ones already won are released and the
    /// refusal propagates with its classification intact. On success the
    /// cart is cleared.
    pub async fn create_order(
        &self,
        user_id: &str,
        new_order: NewOrder,
        now: DateTime<Utc>,
    ) -> EngineResult<Order> {
        let lines = self.db.carts().get_lines(user_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        for line in &lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }
        ensure_unique_vouchers(&lines)?;

        let order_id = Uuid::new_v4().to_string();

        // All-or-nothing reservation. The store has no transactions, so a
        // refusal midway rolls back the reservations already won.
        let mut reserved: Vec<String> = Vec::new();
        for line in &lines {
            if let Some(applied) = &line.voucher {
                match self
                    .vouchers
                    .reserve(&applied.voucher_id, user_id, &order_id, now)
                    .await
                {
                    Ok(_) => reserved.push(applied.voucher_id.clone()),
                    Err(err) => {
                        for voucher_id in &reserved {
                            self.vouchers.release(voucher_id, now).await?;
                        }
                        return Err(err);
                    }
                }
            }
        }

        let settlement = settle(&lines);
        let order = Order {
            id: order_id,
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            lines: lines.iter().map(to_order_line).collect(),
            subtotal_cents: settlement.subtotal_cents,
            discount_cents: settlement.discount_cents,
            total_cents: settlement.total_cents,
            payment_method: new_order.payment_method,
            notes: new_order.notes,
            cancel_reason: None,
            is_rated: false,
            rewarded: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
        };

        self.db.orders().insert(&order).await?;
        self.db.carts().clear(user_id, now).await?;

        info!(
            order_id = %order.id,
            user_id,
            total = order.total_cents,
            vouchers = reserved.len(),
            "order created"
        );
        Ok(order)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Approves a pending order: pending → paid, then consumes its vouchers
    /// and credits the ledger.
    pub async fn approve(
        &self,
        order_id: &str,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> EngineResult<Order> {
        self.require(order_id).await?;

        if !self.db.orders().try_mark_paid(order_id, payment_method, now).await? {
            let current = self.require(order_id).await?;
            return Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                current_status: current.status,
                action: "approve".to_string(),
            }
            .into());
        }

        info!(order_id, "order approved");
        self.apply_paid_effects(order_id, now).await?;
        self.require(order_id).await
    }

    /// Cancels a pending order with a mandatory reason: pending → cancelled,
    /// then releases its reserved vouchers back to the customer's wallet.
    pub async fn cancel(
        &self,
        order_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Order> {
        validate_cancel_reason(reason).map_err(CoreError::from)?;
        self.require(order_id).await?;

        if !self
            .db
            .orders()
            .try_mark_cancelled(order_id, reason.trim(), now)
            .await?
        {
            let current = self.require(order_id).await?;
            return Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                current_status: current.status,
                action: "cancel".to_string(),
            }
            .into());
        }

        info!(order_id, "order cancelled");
        self.release_vouchers(order_id, now).await?;
        self.require(order_id).await
    }

    /// Re-drives the side effects implied by an order's persisted status.
    ///
    /// Safe to call any number of times: consumption, release, and the
    /// ledger credit are each idempotent. Used after a crash between a
    /// status write and its effects, and harmless on a healthy order.
    pub async fn reconcile(&self, order_id: &str, now: DateTime<Utc>) -> EngineResult<Order> {
        let order = self.require(order_id).await?;
        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::Paid => self.apply_paid_effects(order_id, now).await?,
            OrderStatus::Cancelled => self.release_vouchers(order_id, now).await?,
        }
        self.require(order_id).await
    }

    /// Records the customer's rating on their paid order. Idempotent:
    /// rating an already-rated paid order is success.
    pub async fn mark_rated(
        &self,
        order_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let order = self.require(order_id).await?;
        // An order you don't own reads as nonexistent.
        if order.user_id != user_id {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        if self.db.orders().try_mark_rated(order_id, now).await? {
            return Ok(());
        }

        let current = self.require(order_id).await?;
        if current.status == OrderStatus::Paid && current.is_rated {
            return Ok(());
        }
        Err(CoreError::InvalidTransition {
            order_id: order_id.to_string(),
            current_status: current.status,
            action: "rate".to_string(),
        }
        .into())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetches an order, requiring it to exist.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.require(order_id).await
    }

    /// A user's order history.
    pub async fn list_orders(&self, user_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_by_user(user_id).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require(&self, order_id: &str) -> EngineResult<Order> {
        self.db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// The effects of the paid status: consume the order's vouchers and
    /// credit the ledger. Each step is idempotent; the credit is further
    /// gated by the order's rewarded flag.
    async fn apply_paid_effects(&self, order_id: &str, now: DateTime<Utc>) -> EngineResult<()> {
        let order = self.require(order_id).await?;
        for voucher_id in order.voucher_ids() {
            self.vouchers.consume(&voucher_id, now).await?;
        }
        self.ledger.credit_order(&order, now).await?;
        Ok(())
    }

    async fn release_vouchers(&self, order_id: &str, now: DateTime<Utc>) -> EngineResult<()> {
        let order = self.require(order_id).await?;
        for voucher_id in order.voucher_ids() {
            self.vouchers.release(&voucher_id, now).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
