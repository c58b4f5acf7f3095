//! Realtime subscription manager.
//!
//! Provides per-entity change notification without leaking duplicate
//! transport channels: at most one live channel per `table:entity` key.
//! Re-subscribing under an existing key replaces the old channel (tearing
//! it down first) rather than registering a second callback - duplicate
//! delivery and leaked channels are both worse than the brief gap during
//! the swap.

mod transport;

pub use transport::{EventStream, InProcessTransport, RealtimeError, RealtimeTransport, RowFilter};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::debug;

use shophub_core::{ChangeEvent, Table, UserId};

/// Callback invoked for each event delivered on a channel.
///
/// Callbacks run on the channel's forwarding task and are awaited one at a
/// time, preserving per-row delivery order.
pub type EventCallback = Arc<dyn Fn(ChangeEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identity of one channel: `table:entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    table: Table,
    entity: String,
}

impl ChannelKey {
    fn new(table: Table, entity: impl ToString) -> Self {
        Self {
            table,
            entity: entity.to_string(),
        }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.entity)
    }
}

/// A live channel: the task forwarding transport events to the callback.
struct ChannelHandle {
    task: JoinHandle<()>,
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Tracks one push channel per (table, entity) pair and dispatches change
/// events to registered callbacks.
///
/// Cheaply cloneable; clones share the same channel registry.
#[derive(Clone)]
pub struct RealtimeManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    transport: Arc<dyn RealtimeTransport>,
    channels: Mutex<HashMap<ChannelKey, ChannelHandle>>,
}

impl RealtimeManager {
    /// Create a manager over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                transport,
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Open a channel for rows of `table` owned by `owner` and register
    /// `callback` for its events.
    ///
    /// If a channel already exists under the same key it is replaced: the
    /// old channel is torn down before the new one is registered, so a
    /// single event is never delivered twice.
    ///
    /// Must be called from within a tokio runtime (the forwarding task is
    /// spawned on it).
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot open the channel.
    pub fn subscribe(
        &self,
        table: Table,
        owner: UserId,
        callback: EventCallback,
    ) -> Result<ChannelKey, RealtimeError> {
        let key = ChannelKey::new(table, owner);

        // Tear any existing channel down before opening the new one: a
        // brief delivery gap during the swap beats the same event reaching
        // two callbacks.
        if let Ok(mut channels) = self.inner.channels.lock()
            && channels.remove(&key).is_some()
        {
            debug!(channel = %key, "Replacing existing realtime channel");
        }

        let filter = RowFilter::eq(table.owner_column(), owner);
        let mut stream = self.inner.transport.open(table, filter)?;

        let task_key = key.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                callback(event).await;
            }
            debug!(channel = %task_key, "Realtime channel stream ended");
        });

        if let Ok(mut channels) = self.inner.channels.lock() {
            channels.insert(key.clone(), ChannelHandle { task });
        }
        Ok(key)
    }

    /// Close and forget the channel for `(table, owner)`.
    ///
    /// Safe to call when no such channel exists.
    pub fn unsubscribe(&self, table: Table, owner: UserId) {
        let key = ChannelKey::new(table, owner);
        if let Ok(mut channels) = self.inner.channels.lock()
            && channels.remove(&key).is_some()
        {
            debug!(channel = %key, "Closed realtime channel");
        }
    }

    /// Close every tracked channel. Idempotent; used on sign-out.
    pub fn unsubscribe_all(&self) {
        if let Ok(mut channels) = self.inner.channels.lock() {
            let count = channels.len();
            channels.clear();
            if count > 0 {
                debug!(count, "Closed all realtime channels");
            }
        }
    }

    /// Number of currently tracked channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.channels.lock().map_or(0, |channels| channels.len())
    }
}
