//! Shopify OAuth install routes.
//!
//! Handles the app install flow:
//! - Install: redirects the merchant to Shopify's OAuth authorization page
//! - Callback: verifies the signed callback, exchanges the code for an Admin
//!   API token, and registers the cart webhook

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tower_sessions::Session;
use tracing::instrument;

use crate::shopify::{SubscriptionOutcome, WebhookTopic};
use crate::state::AppState;

const OAUTH_STATE_KEY: &str = "shopify_oauth_state";

/// Scopes requested during install.
const OAUTH_SCOPES: &[&str] = &["write_discounts", "read_orders"];

/// Build the OAuth install router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopify/install", get(install))
        .route("/shopify/callback", get(callback))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub shop: Option<String>,
    pub hmac: Option<String>,
    pub timestamp: Option<String>,
    pub host: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

// =============================================================================
// HMAC Verification
// =============================================================================

type HmacSha256 = Hmac<Sha256>;

/// Verify the HMAC signature from a Shopify OAuth callback.
fn verify_callback_hmac(params: &OAuthCallbackParams, api_secret: &str) -> bool {
    let Some(provided_hmac) = &params.hmac else {
        return false;
    };

    // Build the message from sorted params (excluding hmac and signature)
    let mut param_pairs: Vec<(String, String)> = Vec::new();

    if let Some(v) = &params.code {
        param_pairs.push(("code".to_string(), v.clone()));
    }
    if let Some(v) = &params.host {
        param_pairs.push(("host".to_string(), v.clone()));
    }
    if let Some(v) = &params.shop {
        param_pairs.push(("shop".to_string(), v.clone()));
    }
    if let Some(v) = &params.state {
        param_pairs.push(("state".to_string(), v.clone()));
    }
    if let Some(v) = &params.timestamp {
        param_pairs.push(("timestamp".to_string(), v.clone()));
    }

    // Sort alphabetically by key
    param_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    // Build the message string
    let message: String = param_pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    // Compute HMAC-SHA256
    let Ok(mut mac) = HmacSha256::new_from_slice(api_secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());

    let computed = hex::encode(mac.finalize().into_bytes());

    constant_time_compare(&computed, provided_hmac)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /shopify/install - Start the OAuth install flow.
#[instrument(skip(state, session))]
async fn install(State(state): State<AppState>, session: Session) -> Response {
    // Generate a random state parameter for CSRF protection
    let oauth_state = uuid::Uuid::new_v4().to_string();

    // Store state in session
    if let Err(e) = session.insert(OAUTH_STATE_KEY, &oauth_state).await {
        tracing::error!("Failed to store OAuth state: {}", e);
        return Redirect::to("/?error=oauth_failed").into_response();
    }

    // Build redirect URI
    let redirect_uri = format!("{}/shopify/callback", state.config().base_url);

    // Generate authorization URL
    let auth_url = state
        .shopify()
        .authorization_url(&redirect_uri, OAUTH_SCOPES, &oauth_state);

    tracing::info!("Redirecting to Shopify OAuth: {}", auth_url);
    Redirect::to(&auth_url).into_response()
}

/// GET /shopify/callback - Handle the OAuth callback.
#[instrument(skip(state, session, params))]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    // Check for errors from Shopify
    if let Some(error) = &params.error {
        let description = params.error_description.as_deref().unwrap_or_default();
        tracing::error!("Shopify OAuth error: {} - {}", error, description);
        return Redirect::to("/?error=oauth_denied").into_response();
    }

    // Verify HMAC signature from Shopify
    if !verify_callback_hmac(&params, state.shopify().api_secret()) {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return Redirect::to("/?error=oauth_invalid_hmac").into_response();
    }

    // This service manages a single shop; reject callbacks for any other
    if let Some(shop) = &params.shop
        && shop != state.shopify().shop()
    {
        tracing::error!("OAuth callback for unexpected shop: {}", shop);
        return Redirect::to("/?error=oauth_wrong_shop").into_response();
    }

    // Get code and state
    let Some(code) = &params.code else {
        tracing::error!("Missing authorization code in callback");
        return Redirect::to("/?error=oauth_failed").into_response();
    };

    let Some(callback_state) = &params.state else {
        tracing::error!("Missing state parameter in callback");
        return Redirect::to("/?error=oauth_failed").into_response();
    };

    // Verify state matches what we stored
    let stored_state: Option<String> = session.get(OAUTH_STATE_KEY).await.ok().flatten();
    if stored_state.as_ref() != Some(callback_state) {
        tracing::error!("OAuth state mismatch - possible CSRF attack");
        return Redirect::to("/?error=oauth_invalid_state").into_response();
    }

    // Clear the state from session (one-time use)
    let _ = session.remove::<String>(OAUTH_STATE_KEY).await;

    // Exchange code for token (cached in process memory)
    let token = match state.shopify().exchange_code(code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to exchange OAuth code: {}", e);
            return Redirect::to("/?error=oauth_exchange_failed").into_response();
        }
    };

    tracing::info!(
        shop = %token.shop,
        scope = %token.scope,
        "Connected to Shopify store"
    );

    // Register the cart webhook so discount processing starts immediately
    let callback_url = format!("{}/webhooks/carts/update", state.config().base_url);
    match state
        .shopify()
        .create_webhook_subscription(WebhookTopic::CartsUpdate, &callback_url)
        .await
    {
        Ok(SubscriptionOutcome::Created(id)) => {
            tracing::info!(subscription_id = %id, "Registered carts/update webhook");
        }
        Ok(SubscriptionOutcome::AlreadySubscribed) => {
            tracing::debug!("carts/update webhook already registered");
        }
        Err(e) => {
            // The install itself succeeded; surface the problem without
            // bouncing the merchant back through OAuth
            tracing::error!("Failed to register carts/update webhook: {}", e);
            return Redirect::to("/?connected=1&warning=webhook_registration").into_response();
        }
    }

    Redirect::to("/?connected=1").into_response()
}
