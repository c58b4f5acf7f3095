//! Integration tests for the cart store.
//!
//! Cover the cart's contract end to end: merge-by-product semantics,
//! derived totals, full-overwrite sync with coalescing, write-through when
//! signed in, and snapshot persistence across a simulated restart.

use std::time::Duration;

use rust_decimal::Decimal;

use shophub_client::backend::Backend;
use shophub_core::ProductId;
use shophub_integration_tests::{TestContext, cart_line, wait_until};

// =============================================================================
// Merge and Totals
// =============================================================================

#[tokio::test]
async fn test_repeated_adds_merge_into_one_line() {
    let ctx = TestContext::new();
    let product = ProductId::generate();

    ctx.cart.add_item(cart_line(product, 2)).await;
    ctx.cart.add_item(cart_line(product, 1)).await;
    ctx.cart.add_item(cart_line(product, 4)).await;

    let lines = ctx.cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().map(|l| l.quantity), Some(7));
    assert_eq!(ctx.cart.total_items(), 7);
}

#[tokio::test]
async fn test_totals_follow_the_price_formula() {
    let ctx = TestContext::new();
    let product = ProductId::generate();

    // 100 with 10% off, quantity 2 + 1 => 3 x 90 = 270
    ctx.cart.add_item(cart_line(product, 2)).await;
    ctx.cart.add_item(cart_line(product, 1)).await;

    assert_eq!(ctx.cart.total_price(), Decimal::from(270));

    let mut other = cart_line(ProductId::generate(), 2);
    other.unit_price = Decimal::from(50);
    other.discount_percent = Decimal::ZERO;
    ctx.cart.add_item(other).await;

    assert_eq!(ctx.cart.total_items(), 5);
    assert_eq!(ctx.cart.total_price(), Decimal::from(370));
}

#[tokio::test]
async fn test_clear_empties_the_cart() {
    let ctx = TestContext::new();
    ctx.cart.add_item(cart_line(ProductId::generate(), 2)).await;
    ctx.cart.add_item(cart_line(ProductId::generate(), 3)).await;

    ctx.cart.clear_cart().await;

    assert_eq!(ctx.cart.total_items(), 0);
    assert!(ctx.cart.lines().is_empty());
}

#[tokio::test]
async fn test_remove_absent_product_is_a_noop() {
    let ctx = TestContext::new();
    let product = ProductId::generate();
    ctx.cart.add_item(cart_line(product, 2)).await;

    let before = ctx.cart.lines();
    ctx.cart.remove_item(ProductId::generate()).await;

    assert_eq!(ctx.cart.lines(), before);
}

#[tokio::test]
async fn test_update_quantity_zero_removes_the_line() {
    let ctx = TestContext::new();
    let product = ProductId::generate();
    ctx.cart.add_item(cart_line(product, 2)).await;

    ctx.cart.update_quantity(product, 5).await;
    assert_eq!(ctx.cart.total_items(), 5);

    ctx.cart.update_quantity(product, 0).await;
    assert!(ctx.cart.lines().is_empty());
}

// =============================================================================
// Sync
// =============================================================================

#[tokio::test]
async fn test_sync_replaces_local_lines_with_backend_rows() {
    let ctx = TestContext::new();

    // Local-only line (guest, never written to the backend)
    ctx.cart.add_item(cart_line(ProductId::generate(), 9)).await;

    // The backend knows about a different cart
    let server_product = ProductId::generate();
    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(server_product, 1));

    ctx.cart.sync_with_database(ctx.user).await;

    // Full overwrite: the local-only line is gone
    let lines = ctx.cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().map(|l| l.product_id), Some(server_product));
}

#[tokio::test]
async fn test_overlapping_syncs_are_coalesced() {
    let ctx = TestContext::new();
    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(ProductId::generate(), 1));
    ctx.backend.set_fetch_delay(Duration::from_millis(80));

    let triggers: Vec<_> = (0..5)
        .map(|_| {
            let cart = ctx.cart.clone();
            let user = ctx.user;
            tokio::spawn(async move { cart.sync_with_database(user).await })
        })
        .collect();
    for trigger in triggers {
        trigger.await.expect("sync task");
    }

    // One in-flight fetch plus at most one dirty re-fetch, never five
    assert!(ctx.backend.cart_fetch_count() <= 2);
    assert_eq!(ctx.cart.total_items(), 1);
}

#[tokio::test]
async fn test_mutations_write_through_when_signed_in() {
    let ctx = TestContext::new();
    ctx.cart
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");

    let product = ProductId::generate();
    ctx.cart.add_item(cart_line(product, 2)).await;

    let rows = ctx.backend.fetch_cart(ctx.user).await.expect("fetch");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.first().map(|l| l.quantity), Some(2));

    ctx.cart.remove_item(product).await;
    let rows = ctx.backend.fetch_cart(ctx.user).await.expect("fetch");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_failed_write_keeps_local_state_and_surfaces_the_error() {
    let ctx = TestContext::new();
    ctx.cart
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");
    ctx.backend.set_fail_writes(true);

    ctx.cart.add_item(cart_line(ProductId::generate(), 2)).await;

    // Optimistic state stands; the divergence is visible, not silent
    assert_eq!(ctx.cart.total_items(), 2);
    assert!(ctx.cart.last_error().is_some());
    assert!(ctx.backend.fetch_cart(ctx.user).await.expect("fetch").is_empty());
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_recommendations_do_not_touch_cart_lines() {
    let ctx = TestContext::new();
    let recommended = shophub_integration_tests::product("Ceramic Pour-Over Set", 60);
    ctx.backend.seed_product(recommended.clone());
    ctx.cart.add_item(cart_line(ProductId::generate(), 1)).await;

    let before = ctx.cart.lines();
    let products = ctx.cart.load_recommendations(&[recommended.id]).await;

    assert_eq!(products.len(), 1);
    assert_eq!(ctx.cart.recommendations().len(), 1);
    assert_eq!(ctx.cart.lines(), before);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cart_snapshot_survives_restart() {
    let storage = std::sync::Arc::new(shophub_client::persist::MemStore::new());
    let product = ProductId::generate();

    {
        let ctx = TestContext::with_storage(storage.clone());
        ctx.cart.add_item(cart_line(product, 3)).await;
        ctx.cart
            .add_item(cart_line(ProductId::generate(), 1))
            .await;
    }

    // A fresh store over the same storage restores the identical list
    // before any network round-trip.
    let restarted = TestContext::with_storage(storage);
    let lines = restarted.cart.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines.iter().find(|l| l.product_id == product).map(|l| l.quantity),
        Some(3)
    );
    assert_eq!(restarted.cart.total_items(), 4);
}

// =============================================================================
// Realtime
// =============================================================================

#[tokio::test]
async fn test_remote_write_reconciles_via_push_event() {
    let ctx = TestContext::new();
    ctx.cart
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");

    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(ProductId::generate(), 4));

    let cart = ctx.cart.clone();
    assert!(
        wait_until(move || cart.total_items() == 4, Duration::from_secs(1)).await,
        "push event should trigger a sync that pulls the remote line"
    );
}
