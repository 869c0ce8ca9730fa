//! HTTP route handlers.

pub mod install;
pub mod webhooks;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Build the application router (without middleware layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .merge(install::router())
        .merge(webhooks::router())
}

/// Service status document returned from `GET /`.
#[derive(Debug, Serialize)]
struct ServiceStatus {
    service: &'static str,
    shop: String,
    /// Whether an Admin API token is held (install flow completed).
    connected: bool,
}

/// GET / - service status.
async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: env!("CARGO_PKG_NAME"),
        shop: state.shopify().shop().to_string(),
        connected: state.shopify().has_token().await,
    })
}
