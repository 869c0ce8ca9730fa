//! Shopify Admin API client.
//!
//! # Security
//!
//! The Admin API token grants `write_discounts` on the connected store. It is
//! held in process memory only and never written to disk or logs.
//!
//! # Architecture
//!
//! - Hand-written GraphQL documents with serde request/response envelopes
//! - Direct API calls to Shopify, one HTTP request per operation
//! - Rate-limit and auth failures surface as typed errors; retrying is left
//!   to the platform's webhook redelivery
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_app::shopify::{AdminClient, DiscountCreateInput};
//!
//! let client = AdminClient::new(&config.shopify);
//!
//! // OAuth install
//! let url = client.authorization_url("https://example.com/shopify/callback", SCOPES, &state);
//! let token = client.exchange_code(&code).await?;
//!
//! // Create a discount
//! let id = client.create_automatic_discount(input).await?;
//! ```

mod client;
mod discounts;
pub mod types;
mod webhook_subscriptions;

pub use client::{AccessToken, AdminClient};
pub use discounts::DiscountCreateInput;
pub use types::*;
pub use webhook_subscriptions::{SubscriptionOutcome, WebhookTopic};

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// OAuth flow failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// No access token available; the app is not installed yet.
    #[error("No access token; complete the install flow or set SHOPIFY_ACCESS_TOKEN")]
    NoAccessToken,
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::OAuth("token exchange failed".to_string());
        assert_eq!(err.to_string(), "OAuth error: token exchange failed");

        let err = ShopifyError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError {
                message: "Field 'foo' doesn't exist".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Access denied".to_string(),
                locations: vec![],
                path: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'foo' doesn't exist; Access denied"
        );
    }
}
