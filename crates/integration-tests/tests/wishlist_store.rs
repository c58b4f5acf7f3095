//! Integration tests for the wishlist store.

use std::time::Duration;

use shophub_client::backend::Backend;
use shophub_integration_tests::{TestContext, product, wait_until};

#[tokio::test]
async fn test_add_writes_through_when_signed_in() {
    let ctx = TestContext::new();
    ctx.wishlist
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");
    let pillow = product("Linen Throw Pillow", 45);

    ctx.wishlist.add_item(pillow.clone()).await;

    assert!(ctx.wishlist.contains(pillow.id));
    let rows = ctx.backend.fetch_wishlist(ctx.user).await.expect("fetch");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_remote_change_invalidates_via_push() {
    let ctx = TestContext::new();
    ctx.wishlist
        .subscribe_to_realtime(ctx.user)
        .expect("subscribe");

    // Wishlist write from another device, arriving only as a push event
    let organizer = product("Walnut Desk Organizer", 100);
    ctx.backend
        .add_wishlist_item(ctx.user, &organizer)
        .await
        .expect("server-side add");

    let wishlist = ctx.wishlist.clone();
    assert!(
        wait_until(move || wishlist.contains(organizer.id), Duration::from_secs(1)).await,
        "push event should trigger a wishlist re-fetch"
    );
}

#[tokio::test]
async fn test_wishlist_snapshot_survives_restart() {
    let storage = std::sync::Arc::new(shophub_client::persist::MemStore::new());
    let pillow = product("Linen Throw Pillow", 45);

    {
        let ctx = TestContext::with_storage(storage.clone());
        ctx.wishlist.add_item(pillow.clone()).await;
    }

    let restarted = TestContext::with_storage(storage);
    assert!(restarted.wishlist.contains(pillow.id));
}
