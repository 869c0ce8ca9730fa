//! Cart webhook handler.
//!
//! Receives `carts/update` deliveries, authenticates them, and creates a
//! bulk discount when the cart quantity reaches a configured tier.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{AppError, Result};
use crate::shopify::{CartPayload, DiscountCreateInput};
use crate::state::AppState;
use crate::webhooks::{HMAC_HEADER, SHOP_DOMAIN_HEADER, TOPIC_HEADER, WebhookError, verify_webhook_hmac};

/// Create webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/carts/update", post(carts_update))
}

/// Response body for a processed cart delivery.
#[derive(Debug, Serialize)]
struct CartsUpdateResponse {
    /// GID of the created discount, or `null` when the cart was below
    /// every tier.
    discount_id: Option<String>,
}

/// Handle a `carts/update` webhook delivery.
///
/// The raw body is authenticated before parsing; Shopify redelivers on
/// non-2xx responses, so upstream failures return 502.
#[instrument(skip(state, headers, body))]
async fn carts_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CartsUpdateResponse>> {
    // Authenticate the delivery against the raw body bytes
    let signature = headers
        .get(HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    verify_webhook_hmac(state.shopify().api_secret(), body.as_bytes(), signature)?;

    let topic = headers
        .get(TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("carts/update");
    let shop_domain = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    debug!(topic, shop_domain, "Webhook signature verified");

    // Only parse once authenticated
    let cart: CartPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid cart payload: {e}")))?;

    let quantity = cart.total_quantity();

    let Some(value) = state.config().discount.tiers.value_for_quantity(quantity) else {
        debug!(quantity, "Cart below every discount tier, skipping");
        return Ok(Json(CartsUpdateResponse { discount_id: None }));
    };

    let starts_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let input = DiscountCreateInput {
        title: &state.config().discount.title,
        value: value.clone(),
        starts_at: &starts_at,
        ends_at: None,
    };

    let discount_id = state.shopify().create_automatic_discount(input).await?;

    info!(
        cart_token = cart.token.as_deref().unwrap_or_default(),
        quantity,
        value = %value,
        discount_id = %discount_id,
        "Created bulk discount"
    );

    Ok(Json(CartsUpdateResponse {
        discount_id: Some(discount_id),
    }))
}
