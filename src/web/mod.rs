pub mod ai;
pub mod plans;
pub mod voice;

use crate::middleware::rate_limit::{limit_ai_requests, RateLimiter};
use crate::state::SharedState;
use axum::http::StatusCode;
use axum::{middleware, routing::get, Json, Router};
use serde_json::json;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "AI Fitness Coach Backend is running" }))
}

pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "error": message.into() })))
}

pub fn routes(state: SharedState, limiter: RateLimiter) -> Router {
    // Only the provider-backed routes sit behind the limiter; plan CRUD is
    // cheap and stays open.
    let provider_routes = Router::new()
        .merge(ai::router(state.clone()))
        .merge(voice::router(state.clone()))
        .layer(middleware::from_fn_with_state(limiter, limit_ai_requests));

    Router::new()
        .route("/health", get(health))
        .nest("/api", provider_routes.merge(plans::router(state)))
}
