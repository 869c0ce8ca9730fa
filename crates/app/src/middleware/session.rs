//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The OAuth state nonce is
//! the only value ever stored, so sessions are short-lived and nothing
//! persists across restarts.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "cartwheel_session";

/// Session expiry in seconds; long enough to complete the OAuth flow.
const SESSION_EXPIRY_SECONDS: i64 = 10 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AppConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        // SameSite=Lax so the cookie survives the top-level redirect back
        // from Shopify's authorization page
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
