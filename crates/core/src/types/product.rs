//! Product summary type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};
use super::price::apply_discount;

/// Product summary as carried by recommendation and wishlist rows.
///
/// This is the denormalized shape the row API returns, not the full catalog
/// entry (descriptions, variants, and stock live in pages outside this
/// core).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier. Wishlist rows carry this as `product_id`.
    #[serde(alias = "product_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Undiscounted unit price.
    pub unit_price: Decimal,
    /// Percentage discount in `[0, 100]`.
    pub discount_percent: Decimal,
    /// Reference to the product image, if any.
    pub image_ref: Option<String>,
    /// Seller that owns the product.
    pub seller_id: SellerId,
}

impl Product {
    /// Unit price after discount, at full precision.
    #[must_use]
    pub fn discounted_unit_price(&self) -> Decimal {
        apply_discount(self.unit_price, self.discount_percent)
    }
}
