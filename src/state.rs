use crate::services::ai::AiService;
use crate::services::image::ImageService;
use crate::services::speech::SpeechService;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything a request handler may touch. `ai` and `speech` are `None`
/// when the corresponding credential is missing; the affected endpoints
/// answer 503.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ai: Option<Arc<AiService>>,
    pub images: Arc<ImageService>,
    pub speech: Option<Arc<SpeechService>>,
}

pub type SharedState = Arc<AppState>;
