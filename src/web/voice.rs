use crate::state::SharedState;
use crate::web::error_response;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    text: String,
    #[serde(default)]
    section: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/text-to-speech", post(text_to_speech))
        .with_state(state)
}

async fn text_to_speech(
    State(state): State<SharedState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let Some(speech) = &state.speech else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "ElevenLabs API not configured. Please add ELEVENLABS_API_KEY to your .env file.",
        ));
    };

    let payload = speech.synthesize(&req.text, req.section.as_deref()).await;
    Ok(Json(json!({ "audioUrl": payload })))
}
