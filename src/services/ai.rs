use crate::domain::plan::PlanPayload;
use crate::domain::profile::UserProfile;
use crate::services::plan;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs, Role,
};
use async_openai::{config::OpenAIConfig, Client};
use thiserror::Error;

const PLAN_SYSTEM_PROMPT: &str =
    "You are an expert fitness coach and nutritionist. Always answer with a single JSON object \
     and no commentary outside of it.";

const ENHANCE_SYSTEM_PROMPT: &str =
    "You write prompts for a text-to-image diffusion model. Return only the prompt text, nothing else.";

const QUOTE_SYSTEM_PROMPT: &str =
    "You are a fitness coach. Answer in plain text only.";

const DEFAULT_QUOTE: &str = "Every step forward is progress. Keep going! 💪";

/// Provider failures surfaced to the HTTP layer. Malformed plan output is
/// not an error at this level; the extractor absorbs it.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("AI model not available. Please check the model name.")]
    ModelUnavailable,
    #[error("AI provider returned an empty response")]
    EmptyResponse,
    #[error("AI request failed: {0}")]
    Provider(String),
}

/// Chat-provider client. Built once in `main` from process configuration and
/// shared through `AppState`; holds no per-request state.
pub struct AiService {
    client: Client<OpenAIConfig>,
    plan_model: String,
    quick_model: String,
}

impl AiService {
    pub fn new(api_key: String, plan_model: String, quick_model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            plan_model,
            quick_model,
        }
    }

    /// Ask the chat model for a 7-day plan and convert whatever comes back
    /// into a usable payload. Provider errors surface to the caller; output
    /// that merely fails to parse becomes the fallback plan.
    pub async fn generate_plan(&self, profile: &UserProfile) -> Result<PlanPayload, AiError> {
        let prompt = build_plan_prompt(profile);
        tracing::info!(user = %profile.name, model = %self.plan_model, "requesting plan from AI provider");
        let raw = self
            .complete(&self.plan_model, PLAN_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(plan::extract_plan(&raw, profile))
    }

    /// Rewrite a short subject (an exercise name or meal description) into a
    /// detailed visual prompt. No local fallback here: enhancement failures
    /// propagate, the image layer has its own null-image sentinel.
    pub async fn enhance_image_prompt(&self, subject: &str) -> Result<String, AiError> {
        let prompt = format!(
            "Create a detailed, professional prompt for generating a high-quality image of: {subject}.\n\
             The image should be realistic, well-lit, and professionally composed.\n\
             Include specific details about:\n\
             - Lighting (natural, studio, etc.)\n\
             - Composition and angle\n\
             - Style and mood\n\
             - Background setting\n\
             - Visual quality and details\n\
             Make it suitable for Stable Diffusion.\n\
             Return only the prompt text, nothing else."
        );
        let text = self
            .complete(&self.quick_model, ENHANCE_SYSTEM_PROMPT, &prompt)
            .await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(trimmed.to_string())
    }

    /// One short motivational quote. Provider failures degrade to a fixed
    /// default rather than failing the request.
    pub async fn motivation_quote(&self) -> String {
        let prompt =
            "Generate a short, unique fitness motivation quote (1-2 sentences). Plain text only.";
        match self
            .complete(&self.quick_model, QUOTE_SYSTEM_PROMPT, prompt)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => DEFAULT_QUOTE.to_string(),
            Err(err) => {
                tracing::warn!("quote generation failed ({}), using default", err);
                DEFAULT_QUOTE.to_string()
            }
        }
    }

    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String, AiError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                role: Role::System,
                content: system.to_string(),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                role: Role::User,
                content: ChatCompletionRequestUserMessageContent::Text(user.to_string()),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(classify_provider_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_provider_error)?;

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

fn classify_provider_error(err: OpenAIError) -> AiError {
    classify_provider_message(&err.to_string())
}

/// The provider client flattens HTTP and API failures into display strings,
/// so classification is substring-based, mirroring what the provider puts in
/// its error payloads.
fn classify_provider_message(message: &str) -> AiError {
    let lowered = message.to_lowercase();
    if lowered.contains("429") || lowered.contains("rate limit") || lowered.contains("quota") {
        AiError::RateLimited
    } else if lowered.contains("404")
        || lowered.contains("model_not_found")
        || lowered.contains("does not exist")
    {
        AiError::ModelUnavailable
    } else {
        AiError::Provider(message.to_string())
    }
}

fn build_plan_prompt(profile: &UserProfile) -> String {
    let mut prompt = format!(
        "Create a comprehensive, personalized fitness and diet plan based on the following user information:\n\n\
         **User Profile:**\n\
         - Name: {}\n\
         - Age: {}\n\
         - Gender: {}\n\
         - Height: {} cm\n\
         - Weight: {} kg\n\
         - Fitness Goal: {}\n\
         - Fitness Level: {}\n\
         - Workout Location: {}\n\
         - Dietary Preferences: {}\n",
        profile.name,
        profile.age,
        profile.gender,
        profile.height,
        profile.weight,
        profile.fitness_goal,
        profile.fitness_level,
        profile.workout_location,
        profile.dietary_preferences,
    );
    if let Some(history) = &profile.medical_history {
        prompt.push_str(&format!("- Medical History: {history}\n"));
    }
    if let Some(stress) = &profile.stress_level {
        prompt.push_str(&format!("- Stress Level: {stress}\n"));
    }
    prompt.push_str(
        "\n**Requirements:**\n\
         1. Create a detailed 7-day workout plan with specific exercises (sets, reps, rest)\n\
         2. Create a 7-day diet plan with meals (calories, macros, description)\n\
         3. Provide 3-5 actionable lifestyle tips and one motivational message\n\n\
         **Format your response strictly as a JSON object:**\n\
         {\n\
           \"workoutPlan\": { \"day1\": { \"exercises\": [] }, ... },\n\
           \"dietPlan\": { \"day1\": { \"breakfast\": {}, \"lunch\": {}, ... }, ... },\n\
           \"tips\": [\"Tip 1\", \"Tip 2\", \"Tip 3\"],\n\
           \"motivation\": \"Motivational message here\"\n\
         }",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Sam".into(),
            age: 41,
            gender: "male".into(),
            height: 182.0,
            weight: 88.5,
            fitness_goal: "Weight Loss".into(),
            fitness_level: "Beginner".into(),
            workout_location: "Gym".into(),
            dietary_preferences: "No preference".into(),
            medical_history: None,
            stress_level: None,
        }
    }

    #[test]
    fn prompt_contains_profile_fields() {
        let prompt = build_plan_prompt(&profile());
        assert!(prompt.contains("- Name: Sam"));
        assert!(prompt.contains("- Age: 41"));
        assert!(prompt.contains("- Height: 182 cm"));
        assert!(prompt.contains("- Fitness Goal: Weight Loss"));
        assert!(prompt.contains("\"workoutPlan\""));
    }

    #[test]
    fn prompt_omits_absent_optional_fields() {
        let prompt = build_plan_prompt(&profile());
        assert!(!prompt.contains("Medical History"));
        assert!(!prompt.contains("Stress Level"));
    }

    #[test]
    fn prompt_includes_optional_fields_when_present() {
        let mut p = profile();
        p.medical_history = Some("asthma".into());
        p.stress_level = Some("high".into());
        let prompt = build_plan_prompt(&p);
        assert!(prompt.contains("- Medical History: asthma"));
        assert!(prompt.contains("- Stress Level: high"));
    }

    #[test]
    fn classifies_rate_limit_errors() {
        assert!(matches!(
            classify_provider_message("HTTP 429 Too Many Requests"),
            AiError::RateLimited
        ));
        assert!(matches!(
            classify_provider_message("You exceeded your current quota"),
            AiError::RateLimited
        ));
    }

    #[test]
    fn classifies_missing_model_errors() {
        assert!(matches!(
            classify_provider_message("The model `gpt-x` does not exist"),
            AiError::ModelUnavailable
        ));
        assert!(matches!(
            classify_provider_message("404 page not found"),
            AiError::ModelUnavailable
        ));
    }

    #[test]
    fn other_errors_keep_their_message() {
        match classify_provider_message("connection reset by peer") {
            AiError::Provider(msg) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
