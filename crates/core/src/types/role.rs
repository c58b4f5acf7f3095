//! User roles and the signed-in identity.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Role attached to a user account.
///
/// Gates which surfaces the UI exposes. The backend enforces row access
/// independently; the client never re-verifies a role beyond trusting the
/// role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper. Browsing, cart, checkout, orders, wishlist.
    #[default]
    Customer,
    /// Seller back-office: product, inventory, and order management.
    Seller,
    /// Admin dashboard.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Seller => write!(f, "seller"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Backend-issued identity of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier issued by the backend.
    pub user_id: UserId,
    /// Role from the follow-up role lookup.
    pub role: Role,
}
