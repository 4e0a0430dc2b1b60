//! Walks the full promotion loop against an in-memory store: checkout,
//! approval, the spin-attempt grant, a spin, and spending the won voucher.
//!
//! Run with: `cargo run -p velo-engine --example happy_path`

use chrono::Utc;

use velo_core::types::{CartLine, PaymentMethod, VoucherApplication, WheelConfig};
use velo_engine::{EngineResult, NewOrder, OrderService, SpinEngine};
use velo_store::Database;

fn line(product_id: &str, name: &str, price: i64, qty: i64) -> CartLine {
    CartLine {
        product_id: product_id.to_string(),
        name: name.to_string(),
        unit_price_cents: price,
        quantity: qty,
        voucher: None,
    }
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = Database::in_memory();
    let orders = OrderService::new(db.clone());
    let spin = SpinEngine::new(db.clone());
    let user = "customer-1";

    // A small shop: any order of $50 or more earns a spin
    let mut wheel = WheelConfig::default();
    wheel.min_order_cents = 5_000;
    spin.update_wheel(wheel).await?;

    // First purchase: a helmet and two inner tubes
    let now = Utc::now();
    orders.put_cart_line(user, line("helmet-01", "Trail helmet", 4_500, 1), now).await?;
    orders.put_cart_line(user, line("tube-700c", "Inner tube 700c", 800, 2), now).await?;

    let order = orders.create_order(
        user,
        NewOrder {
            payment_method: PaymentMethod::Card,
            notes: Some("pickup on Saturday".to_string()),
        },
        now,
    ).await?;
    println!("order {} pending, total {} cents", order.id, order.total_cents);

    let paid = orders.approve(&order.id, PaymentMethod::Card, Utc::now()).await?;
    println!("order approved, status {}", paid.status);
    println!("spin attempts: {}", orders.ledger().balance(user).await?);

    // Spin until the attempt balance runs out (here: once)
    let outcome = spin.spin(user, Utc::now()).await?;
    println!("wheel landed on '{}'", outcome.segment.label);

    let Some(voucher) = outcome.voucher else {
        println!("no win this time; attempts left: {}", outcome.attempts_remaining);
        return Ok(());
    };
    println!("won voucher {} ({}% off)", voucher.code, voucher.discount_percent);

    // Apply the voucher to the next purchase
    let now = Utc::now();
    let mut discounted = line("saddle-cmf", "Comfort saddle", 3_200, 1);
    discounted.voucher = Some(VoucherApplication {
        voucher_id: voucher.id.clone(),
        code: voucher.code.clone(),
        discount_percent: voucher.discount_percent,
    });
    orders.put_cart_line(user, discounted, now).await?;

    let order = orders.create_order(
        user,
        NewOrder {
            payment_method: PaymentMethod::Cash,
            notes: None,
        },
        now,
    ).await?;
    println!(
        "second order: subtotal {} − discount {} = {} cents",
        order.subtotal_cents, order.discount_cents, order.total_cents
    );

    orders.approve(&order.id, PaymentMethod::Cash, Utc::now()).await?;
    println!("voucher spent; usable vouchers left: {}",
        orders.vouchers().usable_for_user(user, Utc::now()).await?.len());

    Ok(())
}
