//! In-process backend used by the demo and the integration tests.
//!
//! Keeps its tables behind a mutex and publishes a matching change event
//! into an [`InProcessTransport`] after every row write, the same way the
//! managed backend's triggers feed its push channel. Server-side behaviors
//! the client never performs itself (creating notifications, writes from
//! another device) are exposed as explicit methods.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shophub_core::{
    CartLine, ChangeEvent, ChangeKind, Notification, NotificationId, Product, ProductId, Role,
    Table, UserId,
};

use crate::realtime::InProcessTransport;

use super::rows::{CartUpsertRow, WishlistInsertRow};
use super::{Backend, BackendError};

/// In-memory [`Backend`] implementation.
///
/// Cheaply cloneable; clones share the same tables.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    transport: InProcessTransport,
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    fetch_delay_ms: AtomicU64,
    cart_fetches: AtomicUsize,
}

#[derive(Default)]
struct MemoryState {
    identity: Option<UserId>,
    roles: HashMap<UserId, Role>,
    carts: HashMap<UserId, Vec<CartLine>>,
    notifications: Vec<Notification>,
    wishlists: HashMap<UserId, Vec<Product>>,
    products: HashMap<ProductId, Product>,
}

impl MemoryBackend {
    /// Create an empty backend publishing into `transport`.
    #[must_use]
    pub fn new(transport: InProcessTransport) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                transport,
                state: Mutex::new(MemoryState::default()),
                fail_writes: AtomicBool::new(false),
                fetch_delay_ms: AtomicU64::new(0),
                cart_fetches: AtomicUsize::new(0),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, table: Table, kind: ChangeKind, row: serde_json::Value) {
        self.inner.transport.publish(ChangeEvent { kind, table, row });
    }

    fn write_guard(&self) -> Result<(), BackendError> {
        if self.inner.fail_writes.load(Ordering::Acquire) {
            return Err(BackendError::Api {
                status: 500,
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }

    fn cart_row(user: UserId, line: &CartLine) -> serde_json::Value {
        serde_json::to_value(CartUpsertRow::new(user, line)).unwrap_or_default()
    }

    fn wishlist_row(user: UserId, product: &Product) -> serde_json::Value {
        serde_json::to_value(WishlistInsertRow::new(user, product)).unwrap_or_default()
    }

    // =========================================================================
    // Server-Side Hooks
    // =========================================================================

    /// Establish a signed-in identity with the given role.
    pub fn sign_in_as(&self, user: UserId, role: Role) {
        let mut state = self.state();
        state.identity = Some(user);
        state.roles.insert(user, role);
    }

    /// Drop the signed-in identity.
    pub fn sign_out(&self) {
        self.state().identity = None;
    }

    /// Add a product to the catalog.
    pub fn seed_product(&self, product: Product) {
        self.state().products.insert(product.id, product);
    }

    /// Server-side notification creation (order status change, cart
    /// reminder, ...): inserts the row and pushes an insert event.
    pub fn push_notification(&self, notification: Notification) {
        let row = serde_json::to_value(&notification).unwrap_or_default();
        self.state().notifications.push(notification);
        self.publish(Table::Notifications, ChangeKind::Insert, row);
    }

    /// Cart write arriving from outside this client (another tab, another
    /// device): applies the row and pushes the event.
    pub fn insert_cart_line_remotely(&self, user: UserId, line: CartLine) {
        let row = Self::cart_row(user, &line);
        {
            let mut state = self.state();
            let cart = state.carts.entry(user).or_default();
            cart.retain(|l| l.product_id != line.product_id);
            cart.push(line);
        }
        self.publish(Table::CartItems, ChangeKind::Insert, row);
    }

    /// Make every subsequent write fail, for exercising optimistic-update
    /// failure paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::Release);
    }

    /// Delay every cart fetch, for exercising overlapping-sync behavior.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.inner
            .fetch_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), Ordering::Release);
    }

    /// How many cart fetches have been served.
    #[must_use]
    pub fn cart_fetch_count(&self) -> usize {
        self.inner.cart_fetches.load(Ordering::Acquire)
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn fetch_identity(&self) -> Result<Option<UserId>, BackendError> {
        Ok(self.state().identity)
    }

    async fn fetch_role(&self, user: UserId) -> Result<Role, BackendError> {
        Ok(self.state().roles.get(&user).copied().unwrap_or_default())
    }

    async fn fetch_cart(&self, user: UserId) -> Result<Vec<CartLine>, BackendError> {
        let delay = self.inner.fetch_delay_ms.load(Ordering::Acquire);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.cart_fetches.fetch_add(1, Ordering::AcqRel);
        Ok(self.state().carts.get(&user).cloned().unwrap_or_default())
    }

    async fn upsert_cart_line(&self, user: UserId, line: &CartLine) -> Result<(), BackendError> {
        self.write_guard()?;
        let row = Self::cart_row(user, line);
        let kind = {
            let mut state = self.state();
            let cart = state.carts.entry(user).or_default();
            if let Some(existing) = cart.iter_mut().find(|l| l.product_id == line.product_id) {
                *existing = line.clone();
                ChangeKind::Update
            } else {
                cart.push(line.clone());
                ChangeKind::Insert
            }
        };
        self.publish(Table::CartItems, kind, row);
        Ok(())
    }

    async fn delete_cart_line(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(), BackendError> {
        self.write_guard()?;
        let removed = {
            let mut state = self.state();
            let cart = state.carts.entry(user).or_default();
            let before = cart.len();
            cart.retain(|l| l.product_id != product);
            cart.len() < before
        };
        if removed {
            self.publish(
                Table::CartItems,
                ChangeKind::Delete,
                serde_json::json!({ "user_id": user, "product_id": product }),
            );
        }
        Ok(())
    }

    async fn clear_cart(&self, user: UserId) -> Result<(), BackendError> {
        self.write_guard()?;
        let removed = self.state().carts.insert(user, Vec::new()).unwrap_or_default();
        for line in removed {
            self.publish(
                Table::CartItems,
                ChangeKind::Delete,
                serde_json::json!({ "user_id": user, "product_id": line.product_id }),
            );
        }
        Ok(())
    }

    async fn fetch_notifications(&self, user: UserId) -> Result<Vec<Notification>, BackendError> {
        let mut rows: Vec<Notification> = self
            .state()
            .notifications
            .iter()
            .filter(|n| n.user_id == user)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<(), BackendError> {
        self.write_guard()?;
        let row = {
            let mut state = self.state();
            let Some(n) = state
                .notifications
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user)
            else {
                return Err(BackendError::NotFound(format!("notification {id}")));
            };
            n.is_read = true;
            serde_json::to_value(&*n).unwrap_or_default()
        };
        self.publish(Table::Notifications, ChangeKind::Update, row);
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user: UserId) -> Result<(), BackendError> {
        self.write_guard()?;
        let rows: Vec<serde_json::Value> = {
            let mut state = self.state();
            state
                .notifications
                .iter_mut()
                .filter(|n| n.user_id == user && !n.is_read)
                .map(|n| {
                    n.is_read = true;
                    serde_json::to_value(&*n).unwrap_or_default()
                })
                .collect()
        };
        for row in rows {
            self.publish(Table::Notifications, ChangeKind::Update, row);
        }
        Ok(())
    }

    async fn fetch_wishlist(&self, user: UserId) -> Result<Vec<Product>, BackendError> {
        Ok(self.state().wishlists.get(&user).cloned().unwrap_or_default())
    }

    async fn add_wishlist_item(
        &self,
        user: UserId,
        product: &Product,
    ) -> Result<(), BackendError> {
        self.write_guard()?;
        let row = Self::wishlist_row(user, product);
        let inserted = {
            let mut state = self.state();
            let wishlist = state.wishlists.entry(user).or_default();
            if wishlist.iter().any(|p| p.id == product.id) {
                false
            } else {
                wishlist.push(product.clone());
                true
            }
        };
        if inserted {
            self.publish(Table::WishlistItems, ChangeKind::Insert, row);
        }
        Ok(())
    }

    async fn remove_wishlist_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(), BackendError> {
        self.write_guard()?;
        let removed = {
            let mut state = self.state();
            let wishlist = state.wishlists.entry(user).or_default();
            let before = wishlist.len();
            wishlist.retain(|p| p.id != product);
            wishlist.len() < before
        };
        if removed {
            self.publish(
                Table::WishlistItems,
                ChangeKind::Delete,
                serde_json::json!({ "user_id": user, "product_id": product }),
            );
        }
        Ok(())
    }

    async fn fetch_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, BackendError> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}
