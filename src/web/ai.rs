use crate::domain::plan::PlanPayload;
use crate::domain::profile::UserProfile;
use crate::services::ai::AiError;
use crate::services::image::GeneratedImage;
use crate::state::SharedState;
use crate::web::error_response;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ImageRequest {
    prompt: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/generate-plan", post(generate_plan))
        .route("/generate-image", post(generate_image))
        .route("/motivation-quote", get(motivation_quote))
        .with_state(state)
}

async fn generate_plan(
    State(state): State<SharedState>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<PlanPayload>, (StatusCode, Json<serde_json::Value>)> {
    let Some(ai) = &state.ai else {
        return Err(not_configured());
    };

    let payload = ai.generate_plan(&profile).await.map_err(provider_error)?;
    if payload.is_fallback() {
        tracing::info!(user = %profile.name, "served fallback plan");
    }
    Ok(Json(payload))
}

async fn generate_image(
    State(state): State<SharedState>,
    Json(req): Json<ImageRequest>,
) -> Result<Json<GeneratedImage>, (StatusCode, Json<serde_json::Value>)> {
    let Some(ai) = &state.ai else {
        return Err(not_configured());
    };

    let image = state
        .images
        .generate(ai, &req.prompt)
        .await
        .map_err(provider_error)?;
    Ok(Json(image))
}

async fn motivation_quote(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let Some(ai) = &state.ai else {
        return Err(not_configured());
    };

    let quote = ai.motivation_quote().await;
    Ok(Json(json!({ "quote": quote })))
}

fn not_configured() -> (StatusCode, Json<serde_json::Value>) {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "AI service is not configured. Please set OPENAI_API_KEY in your environment.",
    )
}

fn provider_error(err: AiError) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!("AI provider request failed: {}", err);
    let status = match err {
        AiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AiError::ModelUnavailable | AiError::EmptyResponse | AiError::Provider(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    error_response(status, err.to_string())
}
