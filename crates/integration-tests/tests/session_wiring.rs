//! Integration tests for auth-driven store wiring.
//!
//! Sign-in must sync the cart once and open the three push channels;
//! sign-out must tear the channels down without touching the persisted
//! cart.

use std::time::Duration;

use shophub_client::stores::AuthError;
use shophub_core::ProductId;
use shophub_integration_tests::{TestContext, cart_line, unread_notification, wait_until};

#[tokio::test]
async fn test_sign_in_syncs_cart_and_opens_channels() {
    let ctx = TestContext::new();
    let server_product = ProductId::generate();
    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(server_product, 2));

    let identity = ctx.session.sign_in().await.expect("sign in");

    assert_eq!(identity.user_id, ctx.user);
    assert!(ctx.session.is_signed_in());
    // The one-shot sync pulled the authoritative rows
    assert_eq!(ctx.cart.total_items(), 2);
    // Cart, notifications, wishlist channels
    assert_eq!(ctx.realtime.channel_count(), 3);
}

#[tokio::test]
async fn test_sign_in_without_identity_fails() {
    let ctx = TestContext::new();
    ctx.backend.sign_out();

    let result = ctx.session.sign_in().await;

    assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    assert!(!ctx.session.is_signed_in());
    assert_eq!(ctx.realtime.channel_count(), 0);
}

#[tokio::test]
async fn test_signed_in_session_receives_pushes() {
    let ctx = TestContext::new();
    ctx.session.sign_in().await.expect("sign in");

    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(ProductId::generate(), 3));
    ctx.backend
        .push_notification(unread_notification(ctx.user, "Order shipped"));

    let cart = ctx.cart.clone();
    assert!(wait_until(move || cart.total_items() == 3, Duration::from_secs(1)).await);
    let notifications = ctx.notifications.clone();
    assert!(wait_until(move || notifications.unread_count() == 1, Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_sign_out_tears_down_but_keeps_the_cart() {
    let ctx = TestContext::new();
    ctx.session.sign_in().await.expect("sign in");
    ctx.cart.add_item(cart_line(ProductId::generate(), 2)).await;
    let total_before = ctx.cart.total_items();

    ctx.session.sign_out();

    assert!(!ctx.session.is_signed_in());
    assert_eq!(ctx.session.role(), None);
    assert_eq!(ctx.realtime.channel_count(), 0);

    // Pushes no longer reach the store...
    ctx.backend
        .insert_cart_line_remotely(ctx.user, cart_line(ProductId::generate(), 9));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.cart.total_items(), total_before);

    // ...and the persisted cart is intact for the next (guest) session.
    let restarted = TestContext::with_storage(ctx.storage.clone());
    assert_eq!(restarted.cart.total_items(), total_before);
}

#[tokio::test]
async fn test_sign_out_twice_is_harmless() {
    let ctx = TestContext::new();
    ctx.session.sign_in().await.expect("sign in");

    ctx.session.sign_out();
    ctx.session.sign_out();

    assert_eq!(ctx.realtime.channel_count(), 0);
}
