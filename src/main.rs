mod config;
mod db;
mod domain;
mod middleware;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::ai::AiService;
use crate::services::image::ImageService;
use crate::services::speech::SpeechService;
use crate::state::SharedState;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        e
    })?;
    tracing::info!("Database ready");

    let ai = config.openai_api_key.clone().map(|key| {
        Arc::new(AiService::new(
            key,
            config.plan_model.clone(),
            config.quick_model.clone(),
        ))
    });
    if ai.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; plan and image endpoints will answer 503");
    }

    let speech = config
        .elevenlabs_api_key
        .clone()
        .map(|key| Arc::new(SpeechService::new(key, config.audio_dir.clone())));
    if speech.is_none() {
        tracing::warn!("ELEVENLABS_API_KEY not set; text-to-speech will answer 503");
    }

    let images = Arc::new(ImageService::new(config.huggingface_api_token.clone()));

    std::fs::create_dir_all(&config.audio_dir)?;

    let shared: SharedState = Arc::new(state::AppState {
        pool,
        ai,
        images,
        speech,
    });

    let limiter = RateLimiter::new(10, Duration::from_secs(60));
    let sweeper = limiter.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            sweeper.sweep().await;
        }
    });

    let app = web::routes(shared, limiter)
        .nest_service("/audio", ServeDir::new(&config.audio_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
