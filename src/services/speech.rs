use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const TTS_MODEL: &str = "eleven_monolingual_v1";
const FALLBACK_MESSAGE: &str = "TTS service unavailable. Please use browser text-to-speech.";

/// What the text-to-speech endpoint hands back: either a served audio path
/// or an instruction for the client to speak the text itself.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SpeechPayload {
    Url(String),
    BrowserFallback {
        fallback: bool,
        text: String,
        message: String,
        section: Option<String>,
    },
}

/// Text-to-speech client. Renders mp3 files into the directory served under
/// `/audio` and returns the public path.
pub struct SpeechService {
    http: reqwest::Client,
    api_key: String,
    audio_dir: PathBuf,
}

impl SpeechService {
    pub fn new(api_key: String, audio_dir: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            audio_dir,
        }
    }

    /// Synthesize `text` into an mp3 under the audio directory. Any provider
    /// or storage failure degrades to a browser-TTS payload instead of
    /// failing the request.
    pub async fn synthesize(&self, text: &str, section: Option<&str>) -> SpeechPayload {
        tracing::info!(section = section.unwrap_or("tts"), "starting TTS generation");
        let bytes = match self.render_mp3(text).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("speech backend failed ({}), falling back to browser TTS", err);
                return browser_fallback(text, section);
            }
        };
        match self.store(bytes, section).await {
            Ok(public_path) => SpeechPayload::Url(public_path),
            Err(err) => {
                tracing::warn!("could not store audio ({}), falling back to browser TTS", err);
                browser_fallback(text, section)
            }
        }
    }

    async fn render_mp3(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{VOICE_ID}");
        let body = serde_json::json!({
            "text": text,
            "model_id": TTS_MODEL,
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
        });

        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(60))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn store(&self, bytes: Vec<u8>, section: Option<&str>) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let filename = audio_filename(section, Utc::now().timestamp_millis());
        tokio::fs::write(self.audio_dir.join(&filename), bytes).await?;
        tracing::info!(%filename, "audio saved");
        Ok(format!("/audio/{filename}"))
    }
}

/// Filenames carry the section for debuggability; anything that is not
/// alphanumeric is flattened so the section can never escape the audio dir.
fn audio_filename(section: Option<&str>, timestamp_millis: i64) -> String {
    let section = section.filter(|s| !s.is_empty()).unwrap_or("tts");
    let safe: String = section
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("audio_{safe}_{timestamp_millis}.mp3")
}

fn browser_fallback(text: &str, section: Option<&str>) -> SpeechPayload {
    SpeechPayload::BrowserFallback {
        fallback: true,
        text: text.to_string(),
        message: FALLBACK_MESSAGE.to_string(),
        section: section.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_defaults_section_to_tts() {
        assert_eq!(audio_filename(None, 42), "audio_tts_42.mp3");
        assert_eq!(audio_filename(Some(""), 42), "audio_tts_42.mp3");
    }

    #[test]
    fn filename_flattens_unsafe_characters() {
        assert_eq!(
            audio_filename(Some("../motivation day"), 7),
            "audio____motivation_day_7.mp3"
        );
    }

    #[test]
    fn url_payload_serializes_as_plain_string() {
        let payload = SpeechPayload::Url("/audio/audio_tts_1.mp3".into());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!("/audio/audio_tts_1.mp3")
        );
    }

    #[test]
    fn fallback_payload_carries_text_and_flag() {
        let payload = browser_fallback("Keep going", Some("motivation"));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["fallback"], true);
        assert_eq!(value["text"], "Keep going");
        assert_eq!(value["section"], "motivation");
        assert!(value["message"].as_str().unwrap().contains("browser"));
    }
}
