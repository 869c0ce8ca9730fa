//! Decimal money amounts as transmitted by the Shopify Admin API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with its ISO 4217 currency code.
///
/// The Admin API transmits amounts as decimal strings ("19.99"), so the
/// amount is kept as a `Decimal` and serialized through `serde-with-str`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD").
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let money = Money::new(Decimal::new(1999, 2), "USD");
        assert_eq!(money.to_string(), "19.99 USD");

        let money = Money::new(Decimal::new(5, 0), "EUR");
        assert_eq!(money.to_string(), "5.00 EUR");
    }

    #[test]
    fn test_serializes_amount_as_string() {
        let money = Money::new(Decimal::new(1250, 2), "USD");
        let json = serde_json::to_value(&money).expect("serializes");
        assert_eq!(json["amount"], "12.50");
        assert_eq!(json["currency_code"], "USD");
    }

    #[test]
    fn test_deserializes_amount_from_string() {
        let money: Money =
            serde_json::from_str(r#"{"amount":"7.25","currency_code":"CAD"}"#).expect("parses");
        assert_eq!(money.amount, Decimal::new(725, 2));
        assert_eq!(money.currency_code, "CAD");
    }
}
