//! Wishlist store.
//!
//! Structurally a lighter cart: optimistic add/remove with write-through
//! when signed in, full-overwrite fetch from the backend, coarse
//! fetch-on-any-event realtime invalidation, persisted snapshot. Wishlists
//! are small and change rarely, so no sync coalescing is needed here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tracing::{instrument, warn};

use shophub_core::{Product, ProductId, Table, UserId};

use crate::backend::{Backend, BackendError};
use crate::persist::{self, LocalStore, persist_keys};
use crate::realtime::{EventCallback, RealtimeError, RealtimeManager};

/// Client-resident wishlist state.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<WishlistInner>,
}

struct WishlistInner {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn LocalStore>,
    realtime: RealtimeManager,
    state: Mutex<WishlistState>,
    user: Mutex<Option<UserId>>,
}

#[derive(Default)]
struct WishlistState {
    items: Vec<Product>,
    last_error: Option<String>,
}

impl WishlistStore {
    /// Create a wishlist store, restoring the persisted snapshot.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn LocalStore>,
        realtime: RealtimeManager,
    ) -> Self {
        let items: Vec<Product> =
            persist::load_json(storage.as_ref(), persist_keys::WISHLIST).unwrap_or_default();
        Self {
            inner: Arc::new(WishlistInner {
                backend,
                storage,
                realtime,
                state: Mutex::new(WishlistState {
                    items,
                    last_error: None,
                }),
                user: Mutex::new(None),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, WishlistState> {
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
        let items = self.state().items.clone();
        persist::save_json(self.inner.storage.as_ref(), persist_keys::WISHLIST, &items);
    }

    fn record_write_error(&self, error: &BackendError) {
        warn!(error = %error, "Wishlist backend write failed, keeping local state");
        self.state().last_error = Some(error.to_string());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the wishlist.
    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        self.state().items.clone()
    }

    /// Whether `product_id` is on the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.state().items.iter().any(|p| p.id == product_id)
    }

    /// Error from the most recent backend interaction, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the local list with the backend rows for `user`.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist(&self, user: UserId) {
        match self.inner.backend.fetch_wishlist(user).await {
            Ok(items) => {
                {
                    let mut state = self.state();
                    state.items = items;
                    state.last_error = None;
                }
                self.persist();
            }
            Err(e) => {
                warn!(error = %e, "Wishlist fetch failed, keeping local list");
                self.state().last_error = Some(e.to_string());
            }
        }
    }

    /// Add a product; no-op if already present.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add_item(&self, product: Product) {
        let inserted = {
            let mut state = self.state();
            if state.items.iter().any(|p| p.id == product.id) {
                false
            } else {
                state.items.push(product.clone());
                true
            }
        };
        if !inserted {
            return;
        }
        self.persist();

        if let Some(user) = self.bound_user() {
            match self.inner.backend.add_wishlist_item(user, &product).await {
                Ok(()) => self.state().last_error = None,
                Err(e) => self.record_write_error(&e),
            }
        }
    }

    /// Remove a product; no-op if absent.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) {
        let removed = {
            let mut state = self.state();
            let before = state.items.len();
            state.items.retain(|p| p.id != product_id);
            state.items.len() < before
        };
        if !removed {
            return;
        }
        self.persist();

        if let Some(user) = self.bound_user()
            && let Err(e) = self
                .inner
                .backend
                .remove_wishlist_item(user, product_id)
                .await
        {
            self.record_write_error(&e);
        }
    }

    // =========================================================================
    // Realtime Wiring
    // =========================================================================

    /// Bind to `user` and re-fetch the wishlist on any change event for
    /// the user's rows.
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
                store.fetch_wishlist(user).await;
            }
            .boxed()
        });
        self.inner
            .realtime
            .subscribe(Table::WishlistItems, user, callback)?;
        Ok(())
    }

    /// Unbind and tear the push channel down.
    pub fn unsubscribe_from_realtime(&self) {
        let user = self
            .inner
            .user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = user {
            self.inner.realtime.unsubscribe(Table::WishlistItems, user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::persist::MemStore;
    use crate::realtime::InProcessTransport;
    use rust_decimal::Decimal;
    use shophub_core::SellerId;

    fn product() -> Product {
        Product {
            id: ProductId::generate(),
            name: "Linen Throw Pillow".to_string(),
            unit_price: Decimal::from(45),
            discount_percent: Decimal::ZERO,
            image_ref: None,
            seller_id: SellerId::generate(),
        }
    }

    fn store() -> WishlistStore {
        let transport = InProcessTransport::new();
        let backend = Arc::new(MemoryBackend::new(transport.clone()));
        let realtime = RealtimeManager::new(Arc::new(transport));
        WishlistStore::new(backend, Arc::new(MemStore::new()), realtime)
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = store();
        let p = product();

        store.add_item(p.clone()).await;
        store.add_item(p.clone()).await;

        assert_eq!(store.items().len(), 1);
        assert!(store.contains(p.id));
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = store();
        store.add_item(product()).await;
        store.remove_item(ProductId::generate()).await;
        assert_eq!(store.items().len(), 1);
    }
}
