//! Discount creation against the Admin API.

use cartwheel_core::DiscountValue;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{AdminClient, ShopifyError};

/// Input for creating an automatic discount.
#[derive(Debug, Clone)]
pub struct DiscountCreateInput<'a> {
    /// Discount title shown in the admin and at checkout.
    pub title: &'a str,
    /// The discount value (percentage or fixed amount).
    pub value: DiscountValue,
    /// When the discount becomes active (ISO 8601 datetime).
    pub starts_at: &'a str,
    /// When the discount expires (optional).
    pub ends_at: Option<&'a str>,
}

const DISCOUNT_AUTOMATIC_BASIC_CREATE: &str = r"
    mutation discountAutomaticBasicCreate($automaticBasicDiscount: DiscountAutomaticBasicInput!) {
        discountAutomaticBasicCreate(automaticBasicDiscount: $automaticBasicDiscount) {
            automaticDiscountNode {
                id
            }
            userErrors {
                field
                message
            }
        }
    }
";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    discount_automatic_basic_create: Option<CreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload {
    automatic_discount_node: Option<DiscountNode>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct DiscountNode {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

pub(super) fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| {
            let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
            format!("{}: {}", field, e.message)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the `customerGets.value` input for a discount value.
fn value_input(value: &DiscountValue) -> Result<serde_json::Value, ShopifyError> {
    match value {
        DiscountValue::Percentage { percentage } => {
            // The API takes the percentage as a Float fraction of 1
            let fraction = percentage
                .to_f64()
                .ok_or_else(|| ShopifyError::UserError("percentage out of range".to_string()))?;
            Ok(json!({ "percentage": fraction }))
        }
        DiscountValue::FixedAmount { amount } => Ok(json!({
            "discountAmount": {
                "amount": amount.amount.to_string(),
                "appliesOnEachItem": false,
            }
        })),
    }
}

impl AdminClient {
    /// Create an automatic discount (percentage or fixed amount off the cart).
    ///
    /// Returns the discount node GID (e.g.,
    /// `gid://shopify/DiscountAutomaticNode/123`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the mutation reports
    /// user errors.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_automatic_discount(
        &self,
        input: DiscountCreateInput<'_>,
    ) -> Result<String, ShopifyError> {
        let variables = json!({
            "automaticBasicDiscount": {
                "title": input.title,
                "startsAt": input.starts_at,
                "endsAt": input.ends_at,
                "customerGets": {
                    "value": value_input(&input.value)?,
                    "items": { "all": true },
                },
                "combinesWith": {
                    "productDiscounts": false,
                    "orderDiscounts": false,
                    "shippingDiscounts": true,
                },
            }
        });

        let response: CreateResponse = self
            .execute(DISCOUNT_AUTOMATIC_BASIC_CREATE, variables)
            .await?;

        let Some(payload) = response.discount_automatic_basic_create else {
            return Err(ShopifyError::UserError(
                "No payload returned from discount create".to_string(),
            ));
        };

        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(format_user_errors(
                &payload.user_errors,
            )));
        }

        payload.automatic_discount_node.map(|n| n.id).ok_or_else(|| {
            ShopifyError::UserError("No discount returned from create".to_string())
        })
    }
}
