pub mod auth;
pub mod error;
pub mod extract;
pub mod forum;
pub mod middleware;
pub mod preferences;
pub mod reactions;

use std::time::Duration;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use serde_json::json;
use tower::ServiceBuilder;
use tracing::{error, warn};

use savor_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Build the HTTP surface. Reads are public; writes go through `require_auth`.
/// Every request is bounded by `request_timeout`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/forum/categories", get(forum::list_categories))
        .route("/forum/threads", get(forum::list_threads))
        .route("/forum/threads/{thread_id}", get(forum::get_thread));

    let protected_routes = Router::new()
        .route("/forum/threads", post(forum::create_thread))
        .route("/forum/threads/{thread_id}/replies", post(forum::create_reply))
        .route("/forum/threads/{thread_id}/like", put(reactions::toggle_thread_like))
        .route("/forum/replies/{reply_id}/like", put(reactions::toggle_reply_like))
        .route(
            "/user-preference",
            get(preferences::get_preferences).post(preferences::save_preferences),
        )
        .route("/user-preference/status", post(preferences::initialize))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_timeout(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Request timed out" })),
        )
    } else {
        error!("Unhandled middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal Server Error" })),
        )
    }
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::Storage)
}
