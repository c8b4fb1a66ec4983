use anyhow::{Context, Result};
use std::path::PathBuf;

/// Process configuration, read once at startup and handed to the services
/// explicitly. Provider credentials are optional: endpoints backed by an
/// unconfigured provider answer 503 instead of keeping the process from
/// booting.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub openai_api_key: Option<String>,
    pub plan_model: String,
    pub quick_model: String,
    pub huggingface_api_token: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub audio_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL missing")?;
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
            format!("0.0.0.0:{port}")
        });

        Ok(Self {
            bind_addr,
            database_url,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            plan_model: std::env::var("OPENAI_PLAN_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            quick_model: std::env::var("OPENAI_QUICK_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".into()),
            huggingface_api_token: env_opt("HF_API_TOKEN"),
            elevenlabs_api_key: env_opt("ELEVENLABS_API_KEY"),
            audio_dir: std::env::var("AUDIO_DIR")
                .unwrap_or_else(|_| "public/audio".to_string())
                .into(),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
