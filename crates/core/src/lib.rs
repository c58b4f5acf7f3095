//! ShopHub Core - Shared types library.
//!
//! This crate provides common types used across all ShopHub components:
//! - `client` - State-synchronization core (stores, realtime manager, backend client)
//! - `cli` - Command-line tools for driving a session against the backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no filesystem access. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money math, cart lines, notifications, roles,
//!   and row-change events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
