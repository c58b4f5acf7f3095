//! Write-side row payloads for the row API.
//!
//! Read-side rows deserialize straight into the core types (unknown
//! columns are ignored); writes need the owning `user_id` column added,
//! which the core types deliberately do not carry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shophub_core::{CartLine, Product, Role, UserId};

/// Cart row as written to `cart_items`.
#[derive(Debug, Serialize)]
pub(crate) struct CartUpsertRow {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub quantity: u32,
    pub image_ref: Option<String>,
    pub seller_id: Uuid,
}

impl CartUpsertRow {
    pub(crate) fn new(user: UserId, line: &CartLine) -> Self {
        Self {
            user_id: user.as_uuid(),
            product_id: line.product_id.as_uuid(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            discount_percent: line.discount_percent,
            quantity: line.quantity,
            image_ref: line.image_ref.clone(),
            seller_id: line.seller_id.as_uuid(),
        }
    }
}

/// Wishlist row as written to `wishlist_items` (denormalized like the cart
/// rows, so list renders need no join).
#[derive(Debug, Serialize)]
pub(crate) struct WishlistInsertRow {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub image_ref: Option<String>,
    pub seller_id: Uuid,
}

impl WishlistInsertRow {
    pub(crate) fn new(user: UserId, product: &Product) -> Self {
        Self {
            user_id: user.as_uuid(),
            product_id: product.id.as_uuid(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            discount_percent: product.discount_percent,
            image_ref: product.image_ref.clone(),
            seller_id: product.seller_id.as_uuid(),
        }
    }
}

/// Response of the identity endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct IdentityResponse {
    pub id: Uuid,
}

/// Row of the `user_roles` table.
#[derive(Debug, Deserialize)]
pub(crate) struct RoleRow {
    pub role: Role,
}
