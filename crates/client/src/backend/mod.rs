//! Managed backend client.
//!
//! # Architecture
//!
//! The backend is a managed relational store with row-level access
//! policies, consumed over a request/response row API plus a push channel
//! (see [`crate::realtime`]). The backend is always the source of truth;
//! this crate's stores reconcile toward it.
//!
//! - [`Backend`] - the row surface this core consumes: identity and role
//!   lookup, cart rows, notifications, wishlist rows, related-product
//!   lookup
//! - [`RestBackend`] - HTTP implementation against the managed backend's
//!   row API, with `moka` caching of product reads (5 minute TTL)
//! - [`MemoryBackend`] - in-process implementation wired to an
//!   [`crate::realtime::InProcessTransport`], used by the demo and the
//!   integration tests

mod memory;
mod rest;
mod rows;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

use async_trait::async_trait;
use thiserror::Error;

use shophub_core::{CartLine, Notification, NotificationId, Product, ProductId, Role, UserId};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Missing or rejected credentials.
    #[error("Unauthorized")]
    Unauthorized,
}

/// Row read/write surface of the managed backend.
///
/// Every operation is scoped to an owning user; the backend's row policies
/// enforce the same scoping server-side regardless of what a client asks
/// for.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Resolve the identity behind the configured credentials, if any.
    async fn fetch_identity(&self) -> Result<Option<UserId>, BackendError>;

    /// Look up the role attached to a user account.
    async fn fetch_role(&self, user: UserId) -> Result<Role, BackendError>;

    // =========================================================================
    // Cart rows
    // =========================================================================

    /// Fetch the authoritative cart rows for `user`.
    async fn fetch_cart(&self, user: UserId) -> Result<Vec<CartLine>, BackendError>;

    /// Insert or replace one cart row, keyed by `(user, product)`.
    async fn upsert_cart_line(&self, user: UserId, line: &CartLine) -> Result<(), BackendError>;

    /// Delete one cart row; no-op if absent.
    async fn delete_cart_line(&self, user: UserId, product: ProductId)
    -> Result<(), BackendError>;

    /// Delete every cart row for `user`.
    async fn clear_cart(&self, user: UserId) -> Result<(), BackendError>;

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Fetch the recent notification history for `user`, newest first.
    async fn fetch_notifications(&self, user: UserId) -> Result<Vec<Notification>, BackendError>;

    /// Mark one notification as read.
    async fn mark_notification_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<(), BackendError>;

    /// Mark every unread notification for `user` as read in one call.
    async fn mark_all_notifications_read(&self, user: UserId) -> Result<(), BackendError>;

    // =========================================================================
    // Wishlist rows
    // =========================================================================

    /// Fetch the wishlist rows for `user`.
    async fn fetch_wishlist(&self, user: UserId) -> Result<Vec<Product>, BackendError>;

    /// Insert one wishlist row; duplicate inserts are absorbed server-side.
    async fn add_wishlist_item(&self, user: UserId, product: &Product)
    -> Result<(), BackendError>;

    /// Delete one wishlist row; no-op if absent.
    async fn remove_wishlist_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(), BackendError>;

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch product summaries for a set of ids ("frequently bought
    /// together" lookups). Unknown ids are silently absent from the result.
    async fn fetch_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, BackendError>;
}
