//! Command implementations.
//!
//! Every command builds the dependency graph explicitly: config → backend
//! → transport → realtime manager → persistence → stores → session. The
//! stores are plain injected containers; nothing here (or anywhere) is a
//! module-level singleton.

pub mod cart;
pub mod demo;
pub mod notifications;
pub mod session;
pub mod wishlist;

use std::sync::Arc;

use shophub_client::backend::{Backend, RestBackend};
use shophub_client::persist::{FsStore, LocalStore};
use shophub_client::realtime::{InProcessTransport, RealtimeManager};
use shophub_client::stores::{AuthError, AuthSession, CartStore, NotificationsStore, WishlistStore};
use shophub_client::{ClientConfig, ClientError};
use shophub_core::Identity;

/// The fully wired application: stores plus the session that owns their
/// lifecycle.
pub(crate) struct App {
    pub backend: Arc<dyn Backend>,
    pub cart: CartStore,
    pub notifications: NotificationsStore,
    pub wishlist: WishlistStore,
    pub session: AuthSession,
}

/// Build the application root against the configured REST backend.
///
/// One-shot commands never receive push events, so the in-process
/// transport satisfies the realtime seam; a long-lived embedder would
/// supply a transport speaking the backend's push protocol here.
pub(crate) fn build() -> Result<App, ClientError> {
    let config = ClientConfig::from_env()?;
    let backend: Arc<dyn Backend> = Arc::new(RestBackend::new(&config));
    let realtime = RealtimeManager::new(Arc::new(InProcessTransport::new()));
    let storage: Arc<dyn LocalStore> = Arc::new(FsStore::new(&config.data_dir)?);

    let cart = CartStore::new(backend.clone(), storage.clone(), realtime.clone());
    let notifications = NotificationsStore::new(backend.clone(), storage.clone(), realtime.clone());
    let wishlist = WishlistStore::new(backend.clone(), storage, realtime.clone());
    let session = AuthSession::new(
        backend.clone(),
        realtime,
        cart.clone(),
        notifications.clone(),
        wishlist.clone(),
    );

    Ok(App {
        backend,
        cart,
        notifications,
        wishlist,
        session,
    })
}

/// Sign in if credentials are configured; `None` means guest mode.
///
/// # Errors
///
/// Propagates everything except the expected "no credentials" case.
pub(crate) async fn sign_in_if_configured(app: &App) -> Result<Option<Identity>, ClientError> {
    match app.session.sign_in().await {
        Ok(identity) => Ok(Some(identity)),
        Err(AuthError::NotAuthenticated) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Sign in or fail; for commands that make no sense as a guest.
pub(crate) async fn require_sign_in(app: &App) -> Result<Identity, ClientError> {
    Ok(app.session.sign_in().await?)
}
