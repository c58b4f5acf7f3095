//! Scripted demo session against the in-process backend.
//!
//! Exercises the full loop without any external service: sign-in wiring,
//! optimistic cart mutations with write-through, a cart write from
//! "another device" reconciled via a push event, a server-created
//! notification arriving over realtime, and sign-out teardown with the
//! cart surviving.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use shophub_client::backend::{Backend, MemoryBackend};
use shophub_client::persist::{LocalStore, MemStore};
use shophub_client::realtime::{InProcessTransport, RealtimeManager};
use shophub_client::stores::{AuthSession, CartStore, NotificationsStore, WishlistStore};
use shophub_core::{
    CartLine, CurrencyCode, Notification, NotificationId, NotificationKind, Price, Product,
    ProductId, Role, SellerId, UserId,
};

/// Pause long enough for push events to flow through the forwarding tasks.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

fn demo_product(name: &str, price: i64, discount: i64, seller: SellerId) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        unit_price: Decimal::from(price),
        discount_percent: Decimal::from(discount),
        image_ref: None,
        seller_id: seller,
    }
}

fn line_for(product: &Product, quantity: u32) -> CartLine {
    CartLine {
        product_id: product.id,
        name: product.name.clone(),
        unit_price: product.unit_price,
        discount_percent: product.discount_percent,
        quantity,
        image_ref: product.image_ref.clone(),
        seller_id: product.seller_id,
    }
}

/// Run the scripted session.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Application root: everything constructed here, nothing global.
    let transport = InProcessTransport::new();
    let backend_impl = MemoryBackend::new(transport.clone());
    let backend: Arc<dyn Backend> = Arc::new(backend_impl.clone());
    let realtime = RealtimeManager::new(Arc::new(transport));
    let storage: Arc<dyn LocalStore> = Arc::new(MemStore::new());

    let cart = CartStore::new(backend.clone(), storage.clone(), realtime.clone());
    let notifications = NotificationsStore::new(backend.clone(), storage.clone(), realtime.clone());
    let wishlist = WishlistStore::new(backend.clone(), storage, realtime.clone());
    let session = AuthSession::new(
        backend,
        realtime,
        cart.clone(),
        notifications.clone(),
        wishlist.clone(),
    );

    // Seed the "server"
    let user = UserId::generate();
    let seller = SellerId::generate();
    let organizer = demo_product("Walnut Desk Organizer", 100, 10, seller);
    let pourover = demo_product("Ceramic Pour-Over Set", 60, 0, seller);
    let pillow = demo_product("Linen Throw Pillow", 45, 0, seller);
    for product in [&organizer, &pourover, &pillow] {
        backend_impl.seed_product(product.clone());
    }
    backend_impl.sign_in_as(user, Role::Customer);

    println!("== sign in ==");
    let identity = session.sign_in().await?;
    println!("signed in as {} ({})", identity.user_id, identity.role);

    println!();
    println!("== optimistic adds ==");
    cart.add_item(line_for(&organizer, 2)).await;
    cart.add_item(line_for(&pourover, 1)).await;
    cart.add_item(line_for(&organizer, 1)).await; // merges to x3
    println!(
        "cart: {} items, total {}",
        cart.total_items(),
        money(cart.total_price())
    );

    println!();
    println!("== cart write from another device ==");
    backend_impl.insert_cart_line_remotely(user, line_for(&pillow, 1));
    settle().await;
    println!(
        "after push + reconcile: {} items, total {}",
        cart.total_items(),
        money(cart.total_price())
    );

    println!();
    println!("== server-created notification ==");
    backend_impl.push_notification(Notification {
        id: NotificationId::generate(),
        user_id: user,
        title: "Order shipped".to_string(),
        message: "Your order #1042 is on its way".to_string(),
        kind: NotificationKind::Order,
        is_read: false,
        data: None,
        created_at: Utc::now(),
    });
    settle().await;
    println!("unread notifications: {}", notifications.unread_count());
    notifications.mark_all_as_read().await;
    println!("after mark-all-read: {}", notifications.unread_count());

    println!();
    println!("== wishlist ==");
    wishlist.add_item(pillow.clone()).await;
    println!(
        "wishlist has {} item(s), contains pillow: {}",
        wishlist.items().len(),
        wishlist.contains(pillow.id)
    );

    println!();
    println!("== sign out ==");
    session.sign_out();
    backend_impl.insert_cart_line_remotely(user, line_for(&pourover, 5));
    settle().await;
    println!(
        "cart after sign-out (push ignored, lines persisted): {} items, total {}",
        cart.total_items(),
        money(cart.total_price())
    );

    Ok(())
}
