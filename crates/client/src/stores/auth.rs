//! Auth session: sign-in/sign-out transitions and store wiring.
//!
//! The session is the only place that wires stores to the realtime
//! manager. On sign-in the cart syncs once against the authoritative rows,
//! then all three stores subscribe to their push channels; on sign-out the
//! channels come down and the identity is cleared, but the persisted cart
//! stays - a guest cart built before signing in survives signing out
//! again.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, instrument};

use shophub_core::{Identity, Role};

use crate::backend::{Backend, BackendError};
use crate::realtime::{RealtimeError, RealtimeManager};

use super::{CartStore, NotificationsStore, WishlistStore};

/// Errors raised by the authentication handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend resolved no identity for the configured credentials.
    #[error("Not signed in")]
    NotAuthenticated,

    /// Identity or role lookup failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A push channel could not be opened after sign-in.
    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),
}

/// Holds the current identity/role and drives store wiring on session
/// transitions.
///
/// Cheaply cloneable; clones share the same session.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    backend: Arc<dyn Backend>,
    realtime: RealtimeManager,
    cart: CartStore,
    notifications: NotificationsStore,
    wishlist: WishlistStore,
    identity: Mutex<Option<Identity>>,
}

impl AuthSession {
    /// Create a session over explicitly injected stores.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        realtime: RealtimeManager,
        cart: CartStore,
        notifications: NotificationsStore,
        wishlist: WishlistStore,
    ) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                backend,
                realtime,
                cart,
                notifications,
                wishlist,
                identity: Mutex::new(None),
            }),
        }
    }

    /// Current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        *self
            .inner
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current role; `None` when signed out.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Perform the authentication handshake and wire the stores up.
    ///
    /// Resolves the identity behind the configured credentials, looks up
    /// its role, syncs the cart once against the authoritative rows, then
    /// subscribes cart, notifications, and wishlist to realtime.
    ///
    /// # Errors
    ///
    /// Returns an error if no identity is configured, a lookup fails, or a
    /// push channel cannot be opened.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<Identity, AuthError> {
        let user = self
            .inner
            .backend
            .fetch_identity()
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        let role = self.inner.backend.fetch_role(user).await?;
        let identity = Identity { user_id: user, role };

        *self
            .inner
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);

        // Reconcile the guest cart against the backend once, then go live.
        self.inner.cart.sync_with_database(user).await;
        self.inner.cart.subscribe_to_realtime(user)?;
        self.inner.notifications.subscribe_to_realtime(user)?;
        self.inner.wishlist.subscribe_to_realtime(user)?;

        info!(%user, %role, "Signed in");
        Ok(identity)
    }

    /// Tear down the session: unsubscribe every store, close any remaining
    /// channels, clear the identity.
    ///
    /// The persisted cart is deliberately NOT cleared - the cart carries
    /// over between guest and signed-in browsing.
    #[instrument(skip(self))]
    pub fn sign_out(&self) {
        self.inner.cart.unsubscribe_from_realtime();
        self.inner.notifications.unsubscribe_from_realtime();
        self.inner.wishlist.unsubscribe_from_realtime();
        // Catch-all for any channel a store forgot; idempotent.
        self.inner.realtime.unsubscribe_all();

        let signed_out = self
            .inner
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(identity) = signed_out {
            info!(user = %identity.user_id, "Signed out");
        }
    }
}
