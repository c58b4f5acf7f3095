//! Row-change events delivered over the realtime channel.

use serde::{Deserialize, Serialize};

/// Backend tables this client subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    CartItems,
    Notifications,
    WishlistItems,
}

impl Table {
    /// Table name as used by the row API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CartItems => "cart_items",
            Self::Notifications => "notifications",
            Self::WishlistItems => "wishlist_items",
        }
    }

    /// Column holding the owning user id; every subscribed table is
    /// row-scoped by owner.
    #[must_use]
    pub const fn owner_column(&self) -> &'static str {
        "user_id"
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discriminator for a row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change pushed by the backend.
///
/// Delivery is at-least-once; events for the same row arrive in the order
/// the backend emits them, but no cross-row ordering is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened to the row.
    pub kind: ChangeKind,
    /// Table the row belongs to.
    pub table: Table,
    /// The changed row payload. For deletes this is the old row (or the
    /// key columns of it, depending on backend configuration).
    pub row: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_match_row_api() {
        assert_eq!(Table::CartItems.as_str(), "cart_items");
        assert_eq!(Table::Notifications.as_str(), "notifications");
        assert_eq!(Table::WishlistItems.as_str(), "wishlist_items");
    }
}
