//! User notifications store.
//!
//! Merges a pulled history with realtime-pushed inserts, tracks the unread
//! count, and persists a capped recent subset so the bell badge is right
//! immediately after a restart. The unread count is always recomputed from
//! the full list rather than incremented ad hoc - drift between the badge
//! and the list is the kind of bug nobody ever files but everybody sees.
//!
//! `mark_as_read` is optimistic with rollback: the local flip happens
//! before the backend confirms, and is reverted (with the failure recorded
//! in `last_error`) if the write fails, so local state never silently
//! diverges from backend truth.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use shophub_core::{ChangeKind, Notification, NotificationId, Table, UserId};

use crate::backend::Backend;
use crate::persist::{self, LocalStore, persist_keys};
use crate::realtime::{EventCallback, RealtimeError, RealtimeManager};

/// How many notifications are kept in durable local storage. The rest of
/// the history is re-fetched from the backend on demand.
const PERSISTED_LIMIT: usize = 20;

/// Snapshot shape written to local storage.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedNotifications {
    items: Vec<Notification>,
    unread_count: usize,
}

/// Client-resident notification list with unread-count tracking.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone)]
pub struct NotificationsStore {
    inner: Arc<NotificationsInner>,
}

struct NotificationsInner {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn LocalStore>,
    realtime: RealtimeManager,
    state: Mutex<NotificationsState>,
    user: Mutex<Option<UserId>>,
}

#[derive(Default)]
struct NotificationsState {
    /// Newest first.
    items: Vec<Notification>,
    unread_count: usize,
    last_error: Option<String>,
}

impl NotificationsStore {
    /// Create a notifications store, restoring the persisted recent subset.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn LocalStore>,
        realtime: RealtimeManager,
    ) -> Self {
        let restored: Option<PersistedNotifications> =
            persist::load_json(storage.as_ref(), persist_keys::NOTIFICATIONS);
        let state = restored.map_or_else(NotificationsState::default, |snapshot| {
            NotificationsState {
                items: snapshot.items,
                unread_count: snapshot.unread_count,
                last_error: None,
            }
        });

        Self {
            inner: Arc::new(NotificationsInner {
                backend,
                storage,
                realtime,
                state: Mutex::new(state),
                user: Mutex::new(None),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NotificationsState> {
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
        let snapshot = {
            let state = self.state();
            PersistedNotifications {
                items: state.items.iter().take(PERSISTED_LIMIT).cloned().collect(),
                unread_count: state.unread_count,
            }
        };
        persist::save_json(
            self.inner.storage.as_ref(),
            persist_keys::NOTIFICATIONS,
            &snapshot,
        );
    }

    fn recount_unread(state: &mut NotificationsState) {
        state.unread_count = state.items.iter().filter(|n| !n.is_read).count();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the notification list, newest first.
    #[must_use]
    pub fn items(&self) -> Vec<Notification> {
        self.state().items.clone()
    }

    /// Number of unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state().unread_count
    }

    /// Error from the most recent backend interaction, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Pull the recent notification history for `user` and replace the
    /// local list with it.
    #[instrument(skip(self))]
    pub async fn fetch_notifications(&self, user: UserId) {
        match self.inner.backend.fetch_notifications(user).await {
            Ok(items) => {
                {
                    let mut state = self.state();
                    state.items = items;
                    Self::recount_unread(&mut state);
                    state.last_error = None;
                }
                self.persist();
            }
            Err(e) => {
                warn!(error = %e, "Notifications fetch failed, keeping local list");
                self.state().last_error = Some(e.to_string());
            }
        }
    }

    /// Mark one notification as read, optimistically.
    ///
    /// Unknown ids (and already-read entries) are a no-op. On backend
    /// failure the local flip is reverted and the failure is recorded.
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, id: NotificationId) {
        let flipped = {
            let mut state = self.state();
            if let Some(n) = state.items.iter_mut().find(|n| n.id == id && !n.is_read) {
                n.is_read = true;
                Self::recount_unread(&mut state);
                true
            } else {
                false
            }
        };
        if !flipped {
            return;
        }
        self.persist();

        let Some(user) = self.bound_user() else {
            return;
        };
        match self.inner.backend.mark_notification_read(user, id).await {
            Ok(()) => self.state().last_error = None,
            Err(e) => {
                warn!(error = %e, "mark_as_read write failed, reverting local flip");
                {
                    let mut state = self.state();
                    if let Some(n) = state.items.iter_mut().find(|n| n.id == id) {
                        n.is_read = false;
                    }
                    Self::recount_unread(&mut state);
                    state.last_error = Some(e.to_string());
                }
                self.persist();
            }
        }
    }

    /// Mark every notification as read.
    ///
    /// One backend bulk update; local entries only flip once it succeeds.
    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self) {
        if let Some(user) = self.bound_user()
            && let Err(e) = self.inner.backend.mark_all_notifications_read(user).await
        {
            warn!(error = %e, "mark_all_as_read write failed, leaving local state");
            self.state().last_error = Some(e.to_string());
            return;
        }

        {
            let mut state = self.state();
            for n in &mut state.items {
                n.is_read = true;
            }
            state.unread_count = 0;
            state.last_error = None;
        }
        self.persist();
    }

    /// Prepend a notification (realtime-pushed insert).
    ///
    /// Duplicate ids are ignored - push delivery is at-least-once - and the
    /// unread count is recomputed from the full list, never incremented.
    pub fn add_notification(&self, notification: Notification) {
        {
            let mut state = self.state();
            if state.items.iter().any(|n| n.id == notification.id) {
                debug!(id = %notification.id, "Ignoring duplicate notification delivery");
                return;
            }
            state.items.insert(0, notification);
            Self::recount_unread(&mut state);
        }
        self.persist();
    }

    // =========================================================================
    // Realtime Wiring
    // =========================================================================

    /// Bind to `user` and deliver realtime notification inserts into the
    /// local list.
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
        let callback: EventCallback = Arc::new(move |event| {
            let store = store.clone();
            async move {
                if event.kind != ChangeKind::Insert {
                    return;
                }
                match serde_json::from_value::<Notification>(event.row) {
                    Ok(notification) => store.add_notification(notification),
                    Err(e) => warn!(error = %e, "Discarding malformed notification event"),
                }
            }
            .boxed()
        });
        self.inner
            .realtime
            .subscribe(Table::Notifications, user, callback)?;
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
            self.inner.realtime.unsubscribe(Table::Notifications, user);
        }
    }
}
