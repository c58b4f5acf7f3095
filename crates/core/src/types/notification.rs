//! User notification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{NotificationId, UserId};

/// Notification category.
///
/// Matches the `type` column of the backend notifications table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Order status changed (placed, shipped, delivered, ...).
    Order,
    /// Cart reminder.
    Cart,
    /// Wishlist item changed (price drop, back in stock, ...).
    Wishlist,
    /// New review on one of the user's products.
    Review,
    /// Anything else the backend wants to tell the user.
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => write!(f, "order"),
            Self::Cart => write!(f, "cart"),
            Self::Wishlist => write!(f, "wishlist"),
            Self::Review => write!(f, "review"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single user notification.
///
/// Created server-side and delivered either via a list fetch or a realtime
/// insert event. `is_read` only ever goes from `false` to `true` on the
/// client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Globally unique identifier.
    pub id: NotificationId,
    /// Owning user.
    pub user_id: UserId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Category tag.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Whether the user has seen this notification.
    pub is_read: bool,
    /// Opaque payload (order id, product id, ...), shape depends on `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type_column() {
        let n = Notification {
            id: NotificationId::generate(),
            user_id: UserId::generate(),
            title: "Order shipped".to_string(),
            message: "Your order is on its way".to_string(),
            kind: NotificationKind::Order,
            is_read: false,
            data: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).expect("serializes");
        assert_eq!(value.get("type"), Some(&serde_json::json!("order")));
        assert!(value.get("kind").is_none());
    }
}
