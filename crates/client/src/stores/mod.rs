//! Client-resident state stores.
//!
//! Each store owns one slice of session state, applies local mutations
//! optimistically, persists a snapshot, and reconciles against the backend
//! (pull on demand, push via realtime events). [`AuthSession`] owns the
//! sign-in/sign-out transitions that wire the stores to the realtime
//! manager.

mod auth;
mod cart;
mod notifications;
mod wishlist;

pub use auth::{AuthError, AuthSession};
pub use cart::CartStore;
pub use notifications::NotificationsStore;
pub use wishlist::WishlistStore;
