//! Wire types for Shopify webhook deliveries.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Payload of a `carts/update` webhook delivery.
///
/// Only the fields the service reads are modeled; Shopify sends more.
#[derive(Debug, Clone, Deserialize)]
pub struct CartPayload {
    /// Cart token (Shopify sends the token as the cart `id`).
    pub id: Option<String>,
    /// Cart token.
    pub token: Option<String>,
    /// Line items currently in the cart.
    #[serde(default)]
    pub line_items: Vec<CartLineItem>,
}

/// One line item in a cart webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineItem {
    /// Line item ID.
    pub id: Option<i64>,
    /// Quantity of this item in the cart.
    pub quantity: u32,
    /// Product title.
    #[serde(default)]
    pub title: Option<String>,
    /// Unit price as a decimal string.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    /// Variant ID.
    #[serde(default)]
    pub variant_id: Option<i64>,
}

impl CartPayload {
    /// Total quantity of items across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.line_items
            .iter()
            .map(|line| line.quantity)
            .fold(0, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_cart_delivery() {
        let body = r#"{
            "id": "8f76a3c0e5e1c0ffee",
            "token": "8f76a3c0e5e1c0ffee",
            "created_at": "2026-02-14T10:00:00-05:00",
            "updated_at": "2026-02-14T10:05:00-05:00",
            "line_items": [
                {
                    "id": 39072856,
                    "quantity": 2,
                    "title": "Espresso Blend",
                    "price": "14.00",
                    "variant_id": 39072856,
                    "product_id": 632910392
                },
                {
                    "id": 39072857,
                    "quantity": 3,
                    "title": "Filter Papers",
                    "price": "4.50",
                    "variant_id": 39072857,
                    "product_id": 632910393
                }
            ]
        }"#;

        let cart: CartPayload = serde_json::from_str(body).expect("parses");
        assert_eq!(cart.token.as_deref(), Some("8f76a3c0e5e1c0ffee"));
        assert_eq!(cart.line_items.len(), 2);
        assert_eq!(cart.total_quantity(), 5);

        let first = cart.line_items.first().expect("line item");
        assert_eq!(first.price, Some(Decimal::new(1400, 2)));
    }

    #[test]
    fn test_empty_cart() {
        let cart: CartPayload = serde_json::from_str(r#"{"id":null,"token":"t"}"#).expect("parses");
        assert!(cart.line_items.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }
}
