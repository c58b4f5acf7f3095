//! ShopHub Client - State-synchronization core.
//!
//! Keeps shopping-cart, notification, and wishlist state consistent across
//! three sources that disagree with each other at any given moment:
//!
//! - local optimistic mutations (the user just clicked "add to cart")
//! - a persisted local snapshot (the cart survives a process restart)
//! - asynchronous push events from the backend (another device changed a
//!   row, an order shipped)
//!
//! The backend is the eventual source of truth: any sync replaces local
//! state wholesale with the authoritative rows.
//!
//! # Architecture
//!
//! - [`backend`] - row read/write operations against the managed backend
//!   ([`backend::RestBackend`] over HTTP, [`backend::MemoryBackend`] in
//!   process)
//! - [`realtime`] - one push channel per (table, user), replace-on-
//!   resubscribe, torn down on sign-out
//! - [`stores`] - cart, notifications, wishlist, and the auth session that
//!   wires them to realtime
//! - [`persist`] - local durable snapshots (one JSON document per key)
//!
//! Stores are plain dependency-injected state containers: the application
//! root constructs the backend, transport, and storage, hands them to each
//! store, and owns the lifecycle. There is no module-level mutable state in
//! this crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shophub_client::{
//!     backend::RestBackend, persist::FsStore, realtime::{InProcessTransport, RealtimeManager},
//!     stores::{AuthSession, CartStore, NotificationsStore, WishlistStore},
//!     ClientConfig,
//! };
//!
//! let config = ClientConfig::from_env()?;
//! let backend = Arc::new(RestBackend::new(&config));
//! let realtime = RealtimeManager::new(Arc::new(InProcessTransport::new()));
//! let storage = Arc::new(FsStore::new(&config.data_dir)?);
//!
//! let cart = CartStore::new(backend.clone(), storage.clone(), realtime.clone());
//! let notifications = NotificationsStore::new(backend.clone(), storage.clone(), realtime.clone());
//! let wishlist = WishlistStore::new(backend.clone(), storage.clone(), realtime.clone());
//! let session = AuthSession::new(backend, realtime, cart.clone(), notifications, wishlist);
//!
//! let identity = session.sign_in().await?;
//! cart.add_item(line).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod persist;
pub mod realtime;
pub mod stores;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
