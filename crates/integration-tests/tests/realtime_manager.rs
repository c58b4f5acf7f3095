//! Integration tests for the realtime subscription manager.
//!
//! The unit tests in `shophub-client` cover replace-on-resubscribe and
//! idempotent teardown; these exercise the manager the way the stores use
//! it: owner filtering, per-row ordering, and channel isolation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;

use shophub_client::realtime::{EventCallback, InProcessTransport, RealtimeManager};
use shophub_core::{ChangeEvent, ChangeKind, Table, UserId};
use shophub_integration_tests::wait_until;

fn collecting_callback(seen: Arc<Mutex<Vec<ChangeEvent>>>) -> EventCallback {
    Arc::new(move |event| {
        let seen = seen.clone();
        async move {
            if let Ok(mut seen) = seen.lock() {
                seen.push(event);
            }
        }
        .boxed()
    })
}

fn cart_event(owner: UserId, product: &str, quantity: u32) -> ChangeEvent {
    ChangeEvent {
        kind: ChangeKind::Update,
        table: Table::CartItems,
        row: json!({
            "user_id": owner.to_string(),
            "product_id": product,
            "quantity": quantity,
        }),
    }
}

#[tokio::test]
async fn test_events_are_scoped_to_the_channel_owner() {
    let transport = InProcessTransport::new();
    let manager = RealtimeManager::new(Arc::new(transport.clone()));
    let owner = UserId::generate();
    let other = UserId::generate();
    let seen = Arc::new(Mutex::new(Vec::new()));

    manager
        .subscribe(Table::CartItems, owner, collecting_callback(seen.clone()))
        .expect("subscribe");

    transport.publish(cart_event(other, "p1", 1));
    transport.publish(cart_event(owner, "p1", 2));

    let seen_clone = seen.clone();
    assert!(
        wait_until(
            move || seen_clone.lock().map(|s| s.len()).unwrap_or(0) == 1,
            Duration::from_secs(1)
        )
        .await
    );
    let events = seen.lock().expect("lock");
    assert_eq!(
        events.first().and_then(|e| e.row.get("quantity")),
        Some(&json!(2))
    );
}

#[tokio::test]
async fn test_same_row_events_arrive_in_publish_order() {
    let transport = InProcessTransport::new();
    let manager = RealtimeManager::new(Arc::new(transport.clone()));
    let owner = UserId::generate();
    let seen = Arc::new(Mutex::new(Vec::new()));

    manager
        .subscribe(Table::CartItems, owner, collecting_callback(seen.clone()))
        .expect("subscribe");

    for quantity in 1..=5 {
        transport.publish(cart_event(owner, "p1", quantity));
    }

    let seen_clone = seen.clone();
    assert!(
        wait_until(
            move || seen_clone.lock().map(|s| s.len()).unwrap_or(0) == 5,
            Duration::from_secs(1)
        )
        .await
    );
    let quantities: Vec<u64> = seen
        .lock()
        .expect("lock")
        .iter()
        .filter_map(|e| e.row.get("quantity").and_then(serde_json::Value::as_u64))
        .collect();
    assert_eq!(quantities, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_channels_are_isolated_by_table() {
    let transport = InProcessTransport::new();
    let manager = RealtimeManager::new(Arc::new(transport.clone()));
    let owner = UserId::generate();
    let cart_seen = Arc::new(Mutex::new(Vec::new()));
    let notif_seen = Arc::new(Mutex::new(Vec::new()));

    manager
        .subscribe(Table::CartItems, owner, collecting_callback(cart_seen.clone()))
        .expect("subscribe cart");
    manager
        .subscribe(
            Table::Notifications,
            owner,
            collecting_callback(notif_seen.clone()),
        )
        .expect("subscribe notifications");

    transport.publish(cart_event(owner, "p1", 1));

    let cart_clone = cart_seen.clone();
    assert!(
        wait_until(
            move || cart_clone.lock().map(|s| s.len()).unwrap_or(0) == 1,
            Duration::from_secs(1)
        )
        .await
    );
    assert!(notif_seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn test_unsubscribe_all_twice_leaves_no_channels() {
    let transport = InProcessTransport::new();
    let manager = RealtimeManager::new(Arc::new(transport));
    let owner = UserId::generate();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for table in [Table::CartItems, Table::Notifications, Table::WishlistItems] {
        manager
            .subscribe(table, owner, collecting_callback(seen.clone()))
            .expect("subscribe");
    }
    assert_eq!(manager.channel_count(), 3);

    manager.unsubscribe_all();
    assert_eq!(manager.channel_count(), 0);
    manager.unsubscribe_all();
    assert_eq!(manager.channel_count(), 0);
}
