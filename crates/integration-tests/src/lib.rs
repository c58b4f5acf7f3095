//! Integration tests for the ShopHub sync core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shophub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - cart merge/total/sync/persistence behavior
//! - `notifications_store` - unread tracking, optimistic mark-read, caps
//! - `realtime_manager` - channel lifecycle and replace semantics
//! - `session_wiring` - sign-in/sign-out store wiring end to end
//!
//! All tests run against the in-process backend and transport; no external
//! service is required.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use shophub_client::backend::{Backend, MemoryBackend};
use shophub_client::persist::{LocalStore, MemStore};
use shophub_client::realtime::{InProcessTransport, RealtimeManager};
use shophub_client::stores::{AuthSession, CartStore, NotificationsStore, WishlistStore};
use shophub_core::{
    CartLine, Notification, NotificationId, NotificationKind, Product, ProductId, Role, SellerId,
    UserId,
};

/// A fully wired application over the in-process backend, plus handles to
/// the seams the tests poke at.
pub struct TestContext {
    pub backend: MemoryBackend,
    pub transport: InProcessTransport,
    pub realtime: RealtimeManager,
    pub storage: Arc<MemStore>,
    pub cart: CartStore,
    pub notifications: NotificationsStore,
    pub wishlist: WishlistStore,
    pub session: AuthSession,
    pub user: UserId,
}

impl TestContext {
    /// Build a fresh context with a signed-in customer identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemStore::new()))
    }

    /// Build a context over existing storage (for restart simulations).
    #[must_use]
    pub fn with_storage(storage: Arc<MemStore>) -> Self {
        let transport = InProcessTransport::new();
        let backend = MemoryBackend::new(transport.clone());
        let backend_dyn: Arc<dyn Backend> = Arc::new(backend.clone());
        let realtime = RealtimeManager::new(Arc::new(transport.clone()));
        let storage_dyn: Arc<dyn LocalStore> = storage.clone();

        let cart = CartStore::new(backend_dyn.clone(), storage_dyn.clone(), realtime.clone());
        let notifications =
            NotificationsStore::new(backend_dyn.clone(), storage_dyn.clone(), realtime.clone());
        let wishlist = WishlistStore::new(backend_dyn.clone(), storage_dyn, realtime.clone());
        let session = AuthSession::new(
            backend_dyn,
            realtime.clone(),
            cart.clone(),
            notifications.clone(),
            wishlist.clone(),
        );

        let user = UserId::generate();
        backend.sign_in_as(user, Role::Customer);

        Self {
            backend,
            transport,
            realtime,
            storage,
            cart,
            notifications,
            wishlist,
            session,
            user,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll `cond` until it holds or `timeout` passes; returns whether it held.
pub async fn wait_until(cond: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// A cart line for `product` with the standard demo pricing
/// (100 with 10% off).
#[must_use]
pub fn cart_line(product: ProductId, quantity: u32) -> CartLine {
    CartLine {
        product_id: product,
        name: "Walnut Desk Organizer".to_string(),
        unit_price: Decimal::from(100),
        discount_percent: Decimal::from(10),
        quantity,
        image_ref: Some("organizer.webp".to_string()),
        seller_id: SellerId::generate(),
    }
}

/// An unread notification for `user`.
#[must_use]
pub fn unread_notification(user: UserId, title: &str) -> Notification {
    Notification {
        id: NotificationId::generate(),
        user_id: user,
        title: title.to_string(),
        message: format!("{title} - details inside"),
        kind: NotificationKind::Order,
        is_read: false,
        data: None,
        created_at: chrono::Utc::now(),
    }
}

/// A product summary.
#[must_use]
pub fn product(name: &str, price: i64) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        unit_price: Decimal::from(price),
        discount_percent: Decimal::ZERO,
        image_ref: None,
        seller_id: SellerId::generate(),
    }
}
