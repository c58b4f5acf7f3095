//! Push transport abstraction.
//!
//! The managed backend delivers row-change events over a long-lived push
//! connection whose wire protocol is its own concern. This module only
//! defines the seam: a transport hands out filtered event streams, and is
//! responsible for its own connection lifecycle, reconnects, and retries.
//! Nothing above this seam implements backoff.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::Stream;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use shophub_core::{ChangeEvent, Table};

/// How many events a slow subscriber may fall behind before the transport
/// starts dropping its oldest events (delivery is at-least-once, never
/// replayed).
const CHANNEL_CAPACITY: usize = 256;

/// Errors raised when opening a push channel.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The transport could not open the channel.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A stream of row-change events for one subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Row predicate for a subscription, e.g. `user_id = <uuid>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    /// Column the predicate tests.
    pub column: String,
    /// Value the column must equal, in string form.
    pub value: String,
}

impl RowFilter {
    /// Equality predicate on `column`.
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Whether a row payload matches this predicate.
    #[must_use]
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        match row.get(&self.column) {
            Some(serde_json::Value::String(s)) => *s == self.value,
            Some(other) => other.to_string() == self.value,
            None => false,
        }
    }
}

/// A push transport that can open filtered per-table event streams.
///
/// Implementations own reconnect/retry behavior; callers treat a returned
/// stream ending as the channel being gone for good.
pub trait RealtimeTransport: Send + Sync {
    /// Open a channel delivering changes to rows of `table` matching
    /// `filter`, in the order the backend emits them.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened.
    fn open(&self, table: Table, filter: RowFilter) -> Result<EventStream, RealtimeError>;
}

// =============================================================================
// In-Process Transport
// =============================================================================

/// In-process [`RealtimeTransport`] backed by broadcast channels.
///
/// Stands in for the managed backend's pub/sub in tests and the demo: the
/// in-memory backend publishes an event here after every row write, the
/// same way the real backend's triggers feed its push channel.
#[derive(Clone, Default)]
pub struct InProcessTransport {
    inner: Arc<TransportInner>,
}

#[derive(Default)]
struct TransportInner {
    senders: Mutex<HashMap<Table, broadcast::Sender<ChangeEvent>>>,
}

impl InProcessTransport {
    /// Create a transport with no channels open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, table: Table) -> broadcast::Sender<ChangeEvent> {
        let Ok(mut senders) = self.inner.senders.lock() else {
            // A poisoned lock means a panicked publisher; start fresh.
            return broadcast::channel(CHANNEL_CAPACITY).0;
        };
        senders
            .entry(table)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publish one event to every open subscription on its table.
    ///
    /// Returns the number of subscribers the event reached. Events
    /// published with no subscriber are dropped, matching a push channel
    /// nobody is listening to.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let sender = self.sender(event.table);
        sender.send(event).unwrap_or(0)
    }
}

impl RealtimeTransport for InProcessTransport {
    fn open(&self, table: Table, filter: RowFilter) -> Result<EventStream, RealtimeError> {
        let mut receiver = self.sender(table).subscribe();
        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if filter.matches(&event.row) {
                            yield event;
                        }
                    }
                    // Fell behind; skip to the oldest retained event.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(table = %table, skipped, "Realtime subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use shophub_core::ChangeKind;

    fn event(user: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Insert,
            table: Table::CartItems,
            row: json!({ "user_id": user, "product_id": "p1" }),
        }
    }

    #[test]
    fn test_row_filter_matches_string_column() {
        let filter = RowFilter::eq("user_id", "abc");
        assert!(filter.matches(&json!({ "user_id": "abc" })));
        assert!(!filter.matches(&json!({ "user_id": "xyz" })));
        assert!(!filter.matches(&json!({ "other": "abc" })));
    }

    #[tokio::test]
    async fn test_transport_filters_by_row_owner() {
        let transport = InProcessTransport::new();
        let mut stream = transport
            .open(Table::CartItems, RowFilter::eq("user_id", "u1"))
            .expect("open");

        transport.publish(event("u2"));
        transport.publish(event("u1"));

        let delivered = stream.next().await.expect("one event");
        assert_eq!(delivered.row.get("user_id"), Some(&json!("u1")));
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let transport = InProcessTransport::new();
        assert_eq!(transport.publish(event("u1")), 0);
    }
}
