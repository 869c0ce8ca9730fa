//! Integration tests for Cartwheel.
//!
//! The service has no database, so the full router can be exercised
//! in-process with `tower::ServiceExt::oneshot`. Tests stop at the edges
//! that would reach Shopify: a missing access token fails fast inside the
//! Admin client, before any network I/O.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```

use cartwheel_app::config::{AppConfig, DiscountConfig, ShopifyConfig};
use cartwheel_app::state::AppState;
use cartwheel_core::TierSchedule;
use secrecy::SecretString;

/// API secret shared by tests that need to forge valid signatures.
pub const TEST_API_SECRET: &str = "test-api-secret";

/// Build a configuration pointing at a fictional shop.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 3000,
        base_url: "https://cartwheel.example.com".to_string(),
        shopify: ShopifyConfig {
            shop: "test-shop.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            api_key: "test_api_key".to_string(),
            api_secret: SecretString::from(TEST_API_SECRET),
            bootstrap_token: None,
        },
        discount: DiscountConfig {
            title: "Messold".to_string(),
            tiers: TierSchedule::default(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Build application state over [`test_config`].
#[must_use]
pub fn test_state() -> AppState {
    AppState::new(test_config())
}
