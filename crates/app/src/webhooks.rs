//! Webhook delivery authentication.
//!
//! Shopify signs every webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the app's API secret, and sends the base64-encoded digest
//! in the `X-Shopify-Hmac-Sha256` header. Verification must run on the exact
//! bytes received, before any JSON parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Header carrying the webhook topic (e.g., `carts/update`).
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";

/// Header carrying the originating shop domain.
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Webhook authentication errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header was absent or unreadable.
    #[error("Missing webhook signature header")]
    MissingSignature,
    /// The signature did not match the body.
    #[error("Invalid webhook signature")]
    InvalidSignature,
}

/// Verify a webhook delivery signature.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` if the base64 HMAC-SHA256 of
/// `body` under `secret` does not match `provided_hmac`.
pub fn verify_webhook_hmac(
    secret: &str,
    body: &[u8],
    provided_hmac: &str,
) -> Result<(), WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);

    let computed = BASE64.encode(mac.finalize().into_bytes());

    if !constant_time_compare(&computed, provided_hmac) {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("valid key length");
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_verify_valid_signature() {
        let body = br#"{"id":"cart-token","line_items":[]}"#;
        let signature = sign("test-api-secret", body);

        assert!(verify_webhook_hmac("test-api-secret", body, &signature).is_ok());
    }

    #[test]
    fn test_verify_invalid_signature() {
        let body = br#"{"id":"cart-token"}"#;

        let result = verify_webhook_hmac("test-api-secret", body, "bm90LXRoZS1zaWduYXR1cmU=");
        assert_eq!(result, Err(WebhookError::InvalidSignature));
    }

    #[test]
    fn test_verify_tampered_body() {
        let original = br#"{"quantity":1}"#;
        let signature = sign("test-api-secret", original);

        let tampered = br#"{"quantity":9}"#;
        let result = verify_webhook_hmac("test-api-secret", tampered, &signature);
        assert_eq!(result, Err(WebhookError::InvalidSignature));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let body = br#"{"id":"cart-token"}"#;
        let signature = sign("test-api-secret", body);

        let result = verify_webhook_hmac("other-secret", body, &signature);
        assert_eq!(result, Err(WebhookError::InvalidSignature));
    }
}
