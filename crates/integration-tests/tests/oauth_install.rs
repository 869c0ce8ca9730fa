//! Tests for the OAuth install flow routes.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use cartwheel_app::middleware::create_session_layer;
use cartwheel_app::routes;
use cartwheel_integration_tests::{TEST_API_SECRET, test_config, test_state};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

fn app() -> axum::Router {
    let config = test_config();
    axum::Router::new()
        .merge(routes::routes())
        .layer(create_session_layer(&config))
        .with_state(test_state())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string()
}

/// Hex HMAC over sorted `key=value` params, as Shopify signs callbacks.
fn callback_hmac(message: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(TEST_API_SECRET.as_bytes()).expect("valid key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn install_redirects_to_authorization_page() {
    let response = app()
        .oneshot(get("/shopify/install"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = location(&response);
    assert!(
        location.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"),
        "unexpected redirect: {location}"
    );
    assert!(location.contains("client_id=test_api_key"));
    assert!(location.contains("scope=write_discounts%2Cread_orders"));
    assert!(location.contains(
        "redirect_uri=https%3A%2F%2Fcartwheel.example.com%2Fshopify%2Fcallback"
    ));
    assert!(location.contains("state="));

    // The state nonce must be persisted for the callback to verify
    assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn callback_with_invalid_hmac_is_rejected() {
    let response = app()
        .oneshot(get(
            "/shopify/callback?code=abc&state=xyz&shop=test-shop.myshopify.com&timestamp=1700000000&hmac=deadbeef",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=oauth_invalid_hmac");
}

#[tokio::test]
async fn callback_without_hmac_is_rejected() {
    let response = app()
        .oneshot(get("/shopify/callback?code=abc&state=xyz"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=oauth_invalid_hmac");
}

#[tokio::test]
async fn callback_for_wrong_shop_is_rejected() {
    let hmac = callback_hmac(
        "code=abc&shop=other-shop.myshopify.com&state=xyz&timestamp=1700000000",
    );
    let uri = format!(
        "/shopify/callback?code=abc&state=xyz&shop=other-shop.myshopify.com&timestamp=1700000000&hmac={hmac}"
    );

    let response = app().oneshot(get(&uri)).await.expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=oauth_wrong_shop");
}

#[tokio::test]
async fn callback_without_session_state_is_rejected() {
    // Correctly signed, but the session holds no stored nonce (fresh client)
    let hmac = callback_hmac(
        "code=abc&shop=test-shop.myshopify.com&state=xyz&timestamp=1700000000",
    );
    let uri = format!(
        "/shopify/callback?code=abc&state=xyz&shop=test-shop.myshopify.com&timestamp=1700000000&hmac={hmac}"
    );

    let response = app().oneshot(get(&uri)).await.expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=oauth_invalid_state");
}

#[tokio::test]
async fn callback_with_provider_error_is_rejected() {
    let response = app()
        .oneshot(get("/shopify/callback?error=access_denied&error_description=merchant+declined"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=oauth_denied");
}
