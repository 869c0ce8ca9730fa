//! End-to-end tests for the cart webhook endpoint.
//!
//! Drives the full router in-process. Requests stop at the Admin client's
//! token check, so no network I/O happens.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cartwheel_app::middleware::create_session_layer;
use cartwheel_app::routes;
use cartwheel_integration_tests::{TEST_API_SECRET, test_config, test_state};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

const WEBHOOK_PATH: &str = "/webhooks/carts/update";

const SMALL_CART: &str =
    r#"{"id":"tok","token":"tok","line_items":[{"id":1,"quantity":1,"price":"10.00"}]}"#;
const BULK_CART: &str =
    r#"{"id":"tok","token":"tok","line_items":[{"id":1,"quantity":30,"price":"10.00"}]}"#;

fn app() -> axum::Router {
    let config = test_config();
    axum::Router::new()
        .merge(routes::routes())
        .layer(create_session_layer(&config))
        .with_state(test_state())
}

fn sign(body: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(TEST_API_SECRET.as_bytes()).expect("valid key length");
    mac.update(body.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Shopify-Topic", "carts/update")
        .header("X-Shopify-Shop-Domain", "test-shop.myshopify.com");

    if let Some(signature) = signature {
        builder = builder.header("X-Shopify-Hmac-Sha256", signature);
    }

    builder.body(Body::from(body.to_string())).expect("valid request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn status_reports_disconnected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["service"], "cartwheel-app");
    assert_eq!(json["shop"], "test-shop.myshopify.com");
    assert_eq!(json["connected"], false);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let response = app()
        .oneshot(webhook_request(SMALL_CART, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_signature_is_rejected() {
    let response = app()
        .oneshot(webhook_request(SMALL_CART, Some("bm90LXRoZS1zaWduYXR1cmU=")))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signature_over_different_body_is_rejected() {
    let signature = sign(SMALL_CART);
    let response = app()
        .oneshot(webhook_request(BULK_CART, Some(&signature)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cart_below_every_tier_is_skipped() {
    let signature = sign(SMALL_CART);
    let response = app()
        .oneshot(webhook_request(SMALL_CART, Some(&signature)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["discount_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn authenticated_garbage_body_is_bad_request() {
    let body = "not json";
    let signature = sign(body);
    let response = app()
        .oneshot(webhook_request(body, Some(&signature)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn qualifying_cart_without_token_is_bad_gateway() {
    // The cart meets a tier, so the handler reaches for the Admin API;
    // with no token installed the client fails before any network I/O.
    let signature = sign(BULK_CART);
    let response = app()
        .oneshot(webhook_request(BULK_CART, Some(&signature)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
