//! Cart line type and per-line money math.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};
use super::price::apply_discount;

/// One cart entry, keyed by product identity.
///
/// Invariants (enforced by the cart store, not this type):
/// - at most one line per `product_id` within a cart
/// - `quantity` is always at least 1; removal, not zero quantity,
///   represents deletion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line refers to. Unique key within a cart.
    pub product_id: ProductId,
    /// Product display name, denormalized at add time.
    pub name: String,
    /// Undiscounted unit price.
    pub unit_price: Decimal,
    /// Percentage discount in `[0, 100]`.
    pub discount_percent: Decimal,
    /// Number of units. Always >= 1.
    pub quantity: u32,
    /// Reference to the product image, if any.
    pub image_ref: Option<String>,
    /// Seller that owns the product.
    pub seller_id: SellerId,
}

impl CartLine {
    /// Unit price after the line's discount, at full precision.
    #[must_use]
    pub fn discounted_unit_price(&self) -> Decimal {
        apply_discount(self.unit_price, self.discount_percent)
    }

    /// Total for this line: `quantity * discounted_unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.discounted_unit_price()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::generate(),
            name: "Walnut Desk Organizer".to_string(),
            unit_price: Decimal::from(100),
            discount_percent: Decimal::from(10),
            quantity,
            image_ref: None,
            seller_id: SellerId::generate(),
        }
    }

    #[test]
    fn test_line_total_applies_discount() {
        let line = line(3);
        assert_eq!(line.discounted_unit_price(), Decimal::from(90));
        assert_eq!(line.line_total(), Decimal::from(270));
    }

    #[test]
    fn test_line_total_zero_discount() {
        let mut line = line(2);
        line.discount_percent = Decimal::ZERO;
        assert_eq!(line.line_total(), Decimal::from(200));
    }

    #[test]
    fn test_serde_roundtrip_preserves_fields() {
        let line = line(4);
        let json = serde_json::to_string(&line).expect("serializes");
        let restored: CartLine = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(line, restored);
    }
}
