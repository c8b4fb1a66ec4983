use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day-keyed 7-day plan in the shape the chat model is asked to emit.
///
/// Only the fallback path constructs this directly; AI output stays raw JSON
/// (`PlanPayload::Generated`) because the provider's shape is not guaranteed
/// and downstream consumers tolerate missing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub workout_plan: BTreeMap<String, WorkoutDay>,
    pub diet_plan: BTreeMap<String, DietDay>,
    pub tips: Vec<String>,
    pub motivation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: String,
    pub reps: String,
    pub rest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietDay {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
    pub snack1: Meal,
    pub snack2: Meal,
}

/// Meal slot. Calorie and macro values are strings ("350-400", "12g") like
/// the provider emits them; no arithmetic happens server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal: String,
    pub calories: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fats: Option<String>,
}

/// Outcome of plan extraction, tagged with its origin.
///
/// Serialized untagged so the HTTP response body is the bare plan object
/// either way, while Rust callers can still tell an AI-derived plan from the
/// canned substitute without structural comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlanPayload {
    Generated(serde_json::Value),
    Fallback(Plan),
}

impl PlanPayload {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PlanPayload::Fallback(_))
    }
}
