//! Persona proxy server library logic.
//!
//! Browser and terminal clients cannot hold the avatar API credential, so
//! this service accepts `(text, role)`, picks a voice for the role and
//! forwards the request upstream.

pub mod api;
pub mod avatar;
pub mod config;
pub mod middleware;

use avatar::AvatarClient;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use middleware::RateLimiter;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream avatar API client.
    pub avatar: Arc<AvatarClient>,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
    /// Requests per minute allowed per client IP on `/api/*`.
    pub talk_rate_limit: u32,
}

/// Maximum request body size (64 KiB). A talk request is a few KiB of text.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/talk", post(api::talk_handler))
        .route("/api/talk/{talkId}", get(api::talk_status_handler))
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
