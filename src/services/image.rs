use crate::services::ai::{AiError, AiService};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::time::Duration;

const DIFFUSION_MODEL: &str = "stabilityai/stable-diffusion-2-1";
const UNAVAILABLE_NOTE: &str = "Image generation service is currently unavailable. \
     The AI prompt has been prepared for manual image generation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Exercise,
    Meal,
}

/// Result of an image request. `image_url` is a base64 data URL on success
/// and null when only the enhanced prompt could be produced; callers must
/// check it before rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: Option<String>,
    pub prompt: String,
    pub original_prompt: String,
    #[serde(rename = "type")]
    pub kind: ImageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Diffusion-backend client. The API token is optional; the hosted inference
/// endpoint accepts anonymous calls on its free tier.
pub struct ImageService {
    http: reqwest::Client,
    api_token: Option<String>,
}

impl ImageService {
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token,
        }
    }

    /// Enhance the subject into a visual prompt, then render it.
    ///
    /// Enhancement failures propagate and fail the request. A failure of the
    /// diffusion call itself degrades to a prompt-only result with a null
    /// image and an explanatory note.
    pub async fn generate(
        &self,
        ai: &AiService,
        subject: &str,
    ) -> Result<GeneratedImage, AiError> {
        let enhanced = ai.enhance_image_prompt(subject).await?;
        tracing::info!(subject, "enhanced image prompt");

        let kind = classify_subject(subject);
        match self.render(&enhanced).await {
            Ok(bytes) => {
                let encoded = general_purpose::STANDARD.encode(&bytes);
                tracing::info!(subject, bytes = bytes.len(), "image generated");
                Ok(GeneratedImage {
                    image_url: Some(format!("data:image/jpeg;base64,{encoded}")),
                    prompt: enhanced,
                    original_prompt: subject.to_string(),
                    kind,
                    note: None,
                })
            }
            Err(err) => {
                tracing::warn!("image backend failed ({}), returning prompt-only result", err);
                Ok(GeneratedImage {
                    image_url: None,
                    prompt: enhanced,
                    original_prompt: subject.to_string(),
                    kind,
                    note: Some(UNAVAILABLE_NOTE.to_string()),
                })
            }
        }
    }

    async fn render(&self, prompt: &str) -> anyhow::Result<Vec<u8>> {
        let url = format!("https://api-inference.huggingface.co/models/{DIFFUSION_MODEL}");
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "num_inference_steps": 20,
                "guidance_scale": 7.5,
                "width": 512,
                "height": 512,
            }
        });

        let mut request = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(90))
            .json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn classify_subject(subject: &str) -> ImageKind {
    if subject.to_lowercase().contains("exercise") {
        ImageKind::Exercise
    } else {
        ImageKind::Meal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exercise_subjects() {
        assert_eq!(classify_subject("Push-up exercise, home gym"), ImageKind::Exercise);
        assert_eq!(classify_subject("Exercise: burpees"), ImageKind::Exercise);
    }

    #[test]
    fn everything_else_is_a_meal() {
        assert_eq!(classify_subject("Oatmeal with fruits"), ImageKind::Meal);
    }

    #[test]
    fn prompt_only_result_serializes_null_image_and_note() {
        let image = GeneratedImage {
            image_url: None,
            prompt: "studio shot".into(),
            original_prompt: "Oatmeal".into(),
            kind: ImageKind::Meal,
            note: Some(UNAVAILABLE_NOTE.into()),
        };
        let value = serde_json::to_value(&image).unwrap();
        assert!(value["imageUrl"].is_null());
        assert_eq!(value["type"], "meal");
        assert_eq!(value["originalPrompt"], "Oatmeal");
        assert!(value["note"].as_str().unwrap().contains("unavailable"));
    }

    #[test]
    fn successful_result_omits_note() {
        let image = GeneratedImage {
            image_url: Some("data:image/jpeg;base64,AAAA".into()),
            prompt: "studio shot".into(),
            original_prompt: "Squat exercise".into(),
            kind: ImageKind::Exercise,
            note: None,
        };
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["type"], "exercise");
        assert!(value.get("note").is_none());
        assert!(value["imageUrl"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
    }
}
