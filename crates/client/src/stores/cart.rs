//! Shopping cart store.
//!
//! The cart is the one piece of state that must feel instant: every
//! mutation applies to local state first, is persisted so a restart
//! restores it, and is then written to the backend when a user is signed
//! in. The backend stays the eventual source of truth - a sync replaces
//! the whole local line list with the authoritative rows, so a local
//! mutation whose backend write has not landed yet can be lost to a
//! concurrent sync. For a low-throughput cart that trade is fine; what is
//! not fine is overlapping syncs overwriting newer state with staler
//! fetches, so overlapping triggers are coalesced through a single
//! in-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use shophub_core::{CartLine, Product, ProductId, Table, UserId};

use crate::backend::{Backend, BackendError};
use crate::persist::{self, LocalStore, persist_keys};
use crate::realtime::{EventCallback, RealtimeError, RealtimeManager};

/// Client-side authoritative-ish cart state.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn LocalStore>,
    realtime: RealtimeManager,
    state: Mutex<CartState>,
    /// User whose backend cart this store mirrors; `None` while browsing
    /// as a guest (mutations stay local + persisted).
    user: Mutex<Option<UserId>>,
    /// At most one sync runs at a time; see [`CartStore::sync_with_database`].
    sync_guard: tokio::sync::Mutex<()>,
    /// A trigger observed while a sync was running; the running sync
    /// re-fetches once more before releasing the guard.
    sync_dirty: AtomicBool,
}

#[derive(Default)]
struct CartState {
    lines: Vec<CartLine>,
    recommendations: Vec<Product>,
    last_error: Option<String>,
}

impl CartStore {
    /// Create a cart store, restoring the persisted line list so the
    /// last-known cart is available before any network round-trip.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn LocalStore>,
        realtime: RealtimeManager,
    ) -> Self {
        let lines: Vec<CartLine> =
            persist::load_json(storage.as_ref(), persist_keys::CART).unwrap_or_default();
        Self {
            inner: Arc::new(CartStoreInner {
                backend,
                storage,
                realtime,
                state: Mutex::new(CartState {
                    lines,
                    ..CartState::default()
                }),
                user: Mutex::new(None),
                sync_guard: tokio::sync::Mutex::new(()),
                sync_dirty: AtomicBool::new(false),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bound_user(&self) -> Option<UserId> {
        self.inner
            .user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .copied()
    }

    fn persist(&self) {
        let lines = self.state().lines.clone();
        persist::save_json(self.inner.storage.as_ref(), persist_keys::CART, &lines);
    }

    fn record_write_error(&self, error: &BackendError) {
        warn!(error = %error, "Cart backend write failed, keeping local state");
        self.state().last_error = Some(error.to_string());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the current line list.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.state().lines.clone()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.state()
            .lines
            .iter()
            .fold(0, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of all line totals at full precision; round only for display.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.state().lines.iter().map(CartLine::line_total).sum()
    }

    /// Last loaded "frequently bought together" products.
    #[must_use]
    pub fn recommendations(&self) -> Vec<Product> {
        self.state().recommendations.clone()
    }

    /// Error from the most recent backend interaction, if it failed.
    /// Cleared by the next successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line to the cart.
    ///
    /// If a line with the same `product_id` already exists, its quantity
    /// becomes the sum of both quantities and its other fields are kept
    /// unchanged; the incoming price/discount/image are only used when the
    /// line is created.
    #[instrument(skip(self, line), fields(product = %line.product_id, quantity = line.quantity))]
    pub async fn add_item(&self, line: CartLine) {
        if line.quantity == 0 {
            warn!("Ignoring add_item with zero quantity");
            return;
        }

        let merged = {
            let mut state = self.state();
            match state
                .lines
                .iter_mut()
                .find(|l| l.product_id == line.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                    existing.clone()
                }
                None => {
                    state.lines.push(line.clone());
                    line
                }
            }
        };
        self.persist();
        self.write_line(&merged).await;
    }

    /// Remove the line for `product_id`; no-op if absent.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) {
        let removed = {
            let mut state = self.state();
            let before = state.lines.len();
            state.lines.retain(|l| l.product_id != product_id);
            state.lines.len() < before
        };
        if !removed {
            return;
        }
        self.persist();

        if let Some(user) = self.bound_user()
            && let Err(e) = self.inner.backend.delete_cart_line(user, product_id).await
        {
            self.record_write_error(&e);
        }
    }

    /// Set the quantity for `product_id`'s line.
    ///
    /// A quantity of zero is a removal: the no-"present(qty=0)"-state rule
    /// is enforced here rather than left to callers. No-op if the line is
    /// absent.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id).await;
            return;
        }

        let updated = {
            let mut state = self.state();
            state
                .lines
                .iter_mut()
                .find(|l| l.product_id == product_id)
                .map(|line| {
                    line.quantity = quantity;
                    line.clone()
                })
        };
        let Some(updated) = updated else { return };
        self.persist();
        self.write_line(&updated).await;
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        self.state().lines.clear();
        self.persist();

        if let Some(user) = self.bound_user()
            && let Err(e) = self.inner.backend.clear_cart(user).await
        {
            self.record_write_error(&e);
        }
    }

    async fn write_line(&self, line: &CartLine) {
        if let Some(user) = self.bound_user() {
            match self.inner.backend.upsert_cart_line(user, line).await {
                Ok(()) => self.state().last_error = None,
                Err(e) => self.record_write_error(&e),
            }
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Replace the local line list with the authoritative backend rows.
    ///
    /// This is a full overwrite, not a merge: a purely-local addition whose
    /// backend write has not completed yet is lost here and comes back on
    /// the write's own realtime event.
    ///
    /// Overlapping calls are coalesced: while one sync is fetching, further
    /// triggers only mark it dirty, and the in-flight sync re-fetches once
    /// more before finishing. A burst of realtime events therefore costs a
    /// bounded number of fetches and cannot interleave a stale response
    /// over a newer one through this store.
    #[instrument(skip(self))]
    pub async fn sync_with_database(&self, user: UserId) {
        let Ok(_guard) = self.inner.sync_guard.try_lock() else {
            self.inner.sync_dirty.store(true, Ordering::Release);
            return;
        };

        loop {
            self.inner.sync_dirty.store(false, Ordering::Release);
            match self.inner.backend.fetch_cart(user).await {
                Ok(lines) => {
                    {
                        let mut state = self.state();
                        state.lines = lines;
                        state.last_error = None;
                    }
                    self.persist();
                }
                Err(e) => {
                    warn!(error = %e, "Cart sync failed, keeping local lines");
                    self.state().last_error = Some(e.to_string());
                }
            }

            if !self.inner.sync_dirty.swap(false, Ordering::AcqRel) {
                break;
            }
        }
    }

    /// Fetch "frequently bought together" products for the given ids.
    ///
    /// Purely a side query: cart line state is untouched, and a failed
    /// fetch just leaves the recommendations empty.
    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    pub async fn load_recommendations(&self, product_ids: &[ProductId]) -> Vec<Product> {
        match self.inner.backend.fetch_products_by_ids(product_ids).await {
            Ok(products) => {
                self.state().recommendations = products.clone();
                products
            }
            Err(e) => {
                warn!(error = %e, "Recommendations fetch failed");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Realtime Wiring
    // =========================================================================

    /// Bind this store to `user`'s backend cart: mutations start writing
    /// through, and any change event on the user's cart rows triggers a
    /// (coalesced) sync.
    ///
    /// # Errors
    ///
    /// Returns an error if the push channel cannot be opened.
    pub fn subscribe_to_realtime(&self, user: UserId) -> Result<(), RealtimeError> {
        *self
            .inner
            .user
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(user);

        let store = self.clone();
        let callback: EventCallback = Arc::new(move |_event| {
            let store = store.clone();
            async move {
                store.sync_with_database(user).await;
            }
            .boxed()
        });
        self.inner
            .realtime
            .subscribe(Table::CartItems, user, callback)?;
        Ok(())
    }

    /// Unbind from the backend cart and tear the push channel down. The
    /// local (persisted) lines stay: the cart survives sign-out.
    pub fn unsubscribe_from_realtime(&self) {
        let user = self
            .inner
            .user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = user {
            self.inner.realtime.unsubscribe(Table::CartItems, user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::persist::MemStore;
    use crate::realtime::InProcessTransport;
    use shophub_core::SellerId;

    fn store() -> CartStore {
        let transport = InProcessTransport::new();
        let backend = Arc::new(MemoryBackend::new(transport.clone()));
        let realtime = RealtimeManager::new(Arc::new(transport));
        CartStore::new(backend, Arc::new(MemStore::new()), realtime)
    }

    fn line(product_id: ProductId, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            name: "Ceramic Pour-Over Set".to_string(),
            unit_price: Decimal::from(100),
            discount_percent: Decimal::from(10),
            quantity,
            image_ref: None,
            seller_id: SellerId::generate(),
        }
    }

    #[tokio::test]
    async fn test_add_item_merges_by_product_id() {
        let store = store();
        let product = ProductId::generate();

        store.add_item(line(product, 2)).await;
        store.add_item(line(product, 1)).await;

        let lines = store.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|l| l.quantity), Some(3));
        assert_eq!(store.total_price(), Decimal::from(270));
    }

    #[tokio::test]
    async fn test_merge_keeps_existing_fields() {
        let store = store();
        let product = ProductId::generate();

        store.add_item(line(product, 1)).await;
        let mut repriced = line(product, 1);
        repriced.unit_price = Decimal::from(999);
        store.add_item(repriced).await;

        let lines = store.lines();
        assert_eq!(lines.first().map(|l| l.unit_price), Some(Decimal::from(100)));
        assert_eq!(lines.first().map(|l| l.quantity), Some(2));
    }

    #[tokio::test]
    async fn test_update_quantity_to_zero_removes_line() {
        let store = store();
        let product = ProductId::generate();

        store.add_item(line(product, 2)).await;
        store.update_quantity(product, 0).await;

        assert!(store.lines().is_empty());
        assert_eq!(store.total_items(), 0);
    }
}
