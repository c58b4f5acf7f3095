//! Money math using decimal arithmetic.
//!
//! Prices are kept at full precision everywhere; rounding to 2 decimal
//! places happens only at the display layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, rounded to 2 decimal places (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }
}

/// Apply a percentage discount to a unit price at full precision.
///
/// Returns `unit_price * (1 - discount_percent / 100)`.
#[must_use]
pub fn apply_discount(unit_price: Decimal, discount_percent: Decimal) -> Decimal {
    unit_price * (Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_discount() {
        let price = Decimal::from(100);
        assert_eq!(apply_discount(price, Decimal::from(10)), Decimal::from(90));
        assert_eq!(apply_discount(price, Decimal::ZERO), price);
        assert_eq!(apply_discount(price, Decimal::ONE_HUNDRED), Decimal::ZERO);
    }

    #[test]
    fn test_display_pads_to_two_places() {
        let price = Price::new(Decimal::from(5), CurrencyCode::USD);
        assert_eq!(price.display(), "$5.00");

        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD); // 19.99
        assert_eq!(price.display(), "$19.99");
    }
}
