//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_SHOP` - Shop domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_API_KEY` - App API key (OAuth client ID)
//! - `SHOPIFY_API_SECRET` - App API secret key (signs OAuth callbacks and webhooks)
//! - `CARTWHEEL_BASE_URL` - Public URL the app is reachable at
//!
//! ## Optional
//! - `CARTWHEEL_HOST` - Bind address (default: 127.0.0.1)
//! - `CARTWHEEL_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2026-01)
//! - `SHOPIFY_ACCESS_TOKEN` - Pre-provisioned Admin API token; skips the
//!   OAuth install flow for single-shop deployments
//! - `DISCOUNT_TITLE` - Title of created discounts (default: Messold)
//! - `DISCOUNT_TIERS` - Bulk tier schedule as `min_qty:percent` pairs
//!   (default: `3:5,10:10,25:15`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use cartwheel_core::TierSchedule;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for OAuth redirects and webhook callbacks
    pub base_url: String,
    /// Shopify app credentials
    pub shopify: ShopifyConfig,
    /// Discount creation settings
    pub discount: DiscountConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop domain (e.g., your-store.myshopify.com)
    pub shop: String,
    /// Admin API version (e.g., 2026-01)
    pub api_version: String,
    /// App API key (OAuth client ID, safe to expose in URLs)
    pub api_key: String,
    /// App API secret key (OAuth client secret and webhook signing key)
    pub api_secret: SecretString,
    /// Pre-provisioned Admin API access token (custom-app installs)
    pub bootstrap_token: Option<SecretString>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop", &self.shop)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field(
                "bootstrap_token",
                &self.bootstrap_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Discount creation configuration.
#[derive(Debug, Clone)]
pub struct DiscountConfig {
    /// Title of discounts created by the service
    pub title: String,
    /// Bulk-discount tier schedule
    pub tiers: TierSchedule,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CARTWHEEL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARTWHEEL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CARTWHEEL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARTWHEEL_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("CARTWHEEL_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        validate_base_url(&base_url)?;

        let shopify = ShopifyConfig::from_env()?;
        let discount = DiscountConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            discount,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let shop = get_required_env("SHOPIFY_SHOP")?;
        validate_shop_domain(&shop)?;

        Ok(Self {
            shop,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            bootstrap_token: get_optional_env("SHOPIFY_ACCESS_TOKEN").map(SecretString::from),
        })
    }
}

impl DiscountConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let title = get_env_or_default("DISCOUNT_TITLE", "Messold");

        let tiers = match get_optional_env("DISCOUNT_TIERS") {
            Some(raw) => raw.parse::<TierSchedule>().map_err(|e| {
                ConfigError::InvalidEnvVar("DISCOUNT_TIERS".to_string(), e.to_string())
            })?,
            None => TierSchedule::default(),
        };

        Ok(Self { title, tiers })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the base URL is an absolute http(s) URL.
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(base_url).map_err(|e| {
        ConfigError::InvalidEnvVar("CARTWHEEL_BASE_URL".to_string(), e.to_string())
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CARTWHEEL_BASE_URL".to_string(),
            format!("expected an http(s) URL, got scheme '{}'", parsed.scheme()),
        ));
    }

    Ok(())
}

/// Validate that the shop domain is a bare hostname, not a URL.
fn validate_shop_domain(shop: &str) -> Result<(), ConfigError> {
    if shop.is_empty() || shop.contains('/') || shop.contains("://") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_SHOP".to_string(),
            format!("expected a bare domain like my-store.myshopify.com, got '{shop}'"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret from the Partner dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
