//! Integration tests for the notifications store.
//!
//! Cover unread-count derivation, the optimistic mark-read path with
//! rollback, realtime insert delivery, and the capped persisted snapshot.

use std::time::Duration;

use shophub_integration_tests::{TestContext, unread_notification, wait_until};

use shophub_client::persist::LocalStore;
use shophub_core::NotificationId;

// =============================================================================
// Fetch and Unread Tracking
// =============================================================================

#[tokio::test]
async fn test_fetch_recomputes_unread_count() {
    let ctx = TestContext::new();

    let mut read = unread_notification(ctx.user, "Cart reminder");
    read.is_read = true;
    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));
    ctx.backend.push_notification(read);
    ctx.backend.push_notification(unread_notification(ctx.user, "Order delivered"));

    ctx.notifications.fetch_notifications(ctx.user).await;

    assert_eq!(ctx.notifications.items().len(), 3);
    assert_eq!(ctx.notifications.unread_count(), 2);
}

#[tokio::test]
async fn test_mark_all_as_read_flips_everything() {
    let ctx = TestContext::new();
    ctx.notifications
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");
    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));
    ctx.backend.push_notification(unread_notification(ctx.user, "Price drop"));
    ctx.notifications.fetch_notifications(ctx.user).await;
    assert_eq!(ctx.notifications.unread_count(), 2);

    ctx.notifications.mark_all_as_read().await;

    assert_eq!(ctx.notifications.unread_count(), 0);
    assert!(ctx.notifications.items().iter().all(|n| n.is_read));

    // The flip is confirmed server-side, not just local
    ctx.notifications.fetch_notifications(ctx.user).await;
    assert_eq!(ctx.notifications.unread_count(), 0);
}

#[tokio::test]
async fn test_mark_as_read_unknown_id_is_a_noop() {
    let ctx = TestContext::new();
    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));
    ctx.notifications.fetch_notifications(ctx.user).await;

    ctx.notifications.mark_as_read(NotificationId::generate()).await;

    assert_eq!(ctx.notifications.unread_count(), 1);
}

// =============================================================================
// Optimistic Mark-Read
// =============================================================================

#[tokio::test]
async fn test_mark_as_read_confirms_against_backend() {
    let ctx = TestContext::new();
    ctx.notifications
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");
    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));
    ctx.notifications.fetch_notifications(ctx.user).await;
    let id = ctx.notifications.items().first().map(|n| n.id).expect("one item");

    ctx.notifications.mark_as_read(id).await;

    assert_eq!(ctx.notifications.unread_count(), 0);
    // Re-fetch proves the backend saw the update
    ctx.notifications.fetch_notifications(ctx.user).await;
    assert_eq!(ctx.notifications.unread_count(), 0);
    assert!(ctx.notifications.last_error().is_none());
}

#[tokio::test]
async fn test_mark_as_read_rolls_back_on_backend_failure() {
    let ctx = TestContext::new();
    ctx.notifications
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");
    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));
    ctx.notifications.fetch_notifications(ctx.user).await;
    let id = ctx.notifications.items().first().map(|n| n.id).expect("one item");

    ctx.backend.set_fail_writes(true);
    ctx.notifications.mark_as_read(id).await;

    // The optimistic flip was reverted and the failure surfaced
    assert_eq!(ctx.notifications.unread_count(), 1);
    assert!(ctx.notifications.items().iter().all(|n| !n.is_read));
    assert!(ctx.notifications.last_error().is_some());
}

// =============================================================================
// Realtime Inserts
// =============================================================================

#[tokio::test]
async fn test_pushed_insert_lands_in_the_list() {
    let ctx = TestContext::new();
    ctx.notifications
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");

    ctx.backend.push_notification(unread_notification(ctx.user, "Order shipped"));

    let store = ctx.notifications.clone();
    assert!(
        wait_until(move || store.unread_count() == 1, Duration::from_secs(1)).await,
        "realtime insert should reach the store"
    );
    assert_eq!(
        ctx.notifications.items().first().map(|n| n.title.clone()),
        Some("Order shipped".to_string())
    );
}

#[tokio::test]
async fn test_duplicate_delivery_is_absorbed() {
    let ctx = TestContext::new();
    let n = unread_notification(ctx.user, "Order shipped");

    ctx.notifications.add_notification(n.clone());
    ctx.notifications.add_notification(n);

    assert_eq!(ctx.notifications.items().len(), 1);
    assert_eq!(ctx.notifications.unread_count(), 1);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_persisted_snapshot_is_capped_at_twenty() {
    let ctx = TestContext::new();
    for i in 0..25 {
        ctx.notifications
            .add_notification(unread_notification(ctx.user, &format!("Notification {i}")));
    }
    assert_eq!(ctx.notifications.unread_count(), 25);

    let raw = ctx
        .storage
        .get("notifications")
        .expect("storage readable")
        .expect("snapshot present");
    let snapshot: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let persisted_items = snapshot
        .get("items")
        .and_then(serde_json::Value::as_array)
        .expect("items array");

    assert_eq!(persisted_items.len(), 20);
    assert_eq!(
        snapshot.get("unread_count"),
        Some(&serde_json::json!(25)),
        "unread count is persisted alongside the capped list"
    );
}

#[tokio::test]
async fn test_snapshot_restores_after_restart() {
    let storage = std::sync::Arc::new(shophub_client::persist::MemStore::new());
    {
        let ctx = TestContext::with_storage(storage.clone());
        ctx.notifications
            .add_notification(unread_notification(ctx.user, "Order shipped"));
        ctx.notifications
            .add_notification(unread_notification(ctx.user, "Price drop"));
    }

    let restarted = TestContext::with_storage(storage);
    assert_eq!(restarted.notifications.items().len(), 2);
    assert_eq!(restarted.notifications.unread_count(), 2);
}
