use serde::{Deserialize, Serialize};

/// Biometric and lifestyle data submitted by the client form. Consumed once
/// per plan-generation request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub fitness_goal: String,
    pub fitness_level: String,
    pub workout_location: String,
    pub dietary_preferences: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
}
