use crate::domain::plan::{DietDay, Exercise, Meal, Plan, PlanPayload, WorkoutDay};
use crate::domain::profile::UserProfile;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static FENCED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").unwrap());
static BRACED_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Turn a raw chat-model response into a plan.
///
/// Total: provider output that does not contain parseable JSON yields the
/// static fallback plan instead of an error. Whatever parses is returned
/// as-is, with no schema validation.
pub fn extract_plan(raw: &str, profile: &UserProfile) -> PlanPayload {
    let (candidate, origin) = json_candidate(raw);
    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(value) => {
            tracing::info!(origin, "parsed plan JSON from AI response");
            PlanPayload::Generated(value)
        }
        Err(err) => {
            tracing::warn!(origin, "unparseable AI response ({}), substituting fallback plan", err);
            PlanPayload::Fallback(fallback_plan(profile))
        }
    }
}

/// Best-effort location of the JSON object inside free-form model output.
/// A fenced code block wins, then a whole-text brace match, then the text
/// unmodified. The second label of the pair only feeds diagnostics.
fn json_candidate(raw: &str) -> (&str, &'static str) {
    if let Some(m) = FENCED_OBJECT.captures(raw).and_then(|caps| caps.get(1)) {
        return (m.as_str(), "code_block");
    }
    if let Some(m) = BRACED_OBJECT.find(raw) {
        return (m.as_str(), "brace_match");
    }
    (raw, "raw_text")
}

/// Schema-complete generic plan substituted when the AI path is unusable.
/// Pure and deterministic; only `name` and `fitness_goal` flow into it.
pub fn fallback_plan(profile: &UserProfile) -> Plan {
    let exercises = vec![
        Exercise {
            name: "Warm-up Cardio".into(),
            sets: "1".into(),
            reps: "10 minutes".into(),
            rest: "2 min".into(),
            description: Some("Light cardio to increase heart rate and warm up muscles".into()),
        },
        Exercise {
            name: "Bodyweight Exercises".into(),
            sets: "3".into(),
            reps: "12-15".into(),
            rest: "60s".into(),
            description: Some("Full body workout using bodyweight".into()),
        },
    ];

    let diet_day = DietDay {
        breakfast: Meal {
            meal: "Oatmeal with fruits and nuts".into(),
            calories: "350-400".into(),
            protein: Some("12g".into()),
            carbs: Some("60g".into()),
            fats: Some("8g".into()),
        },
        lunch: Meal {
            meal: "Balanced meal with protein and vegetables".into(),
            calories: "450-500".into(),
            protein: Some("25g".into()),
            carbs: Some("50g".into()),
            fats: Some("15g".into()),
        },
        dinner: Meal {
            meal: "Lean protein with complex carbs".into(),
            calories: "400-450".into(),
            protein: Some("30g".into()),
            carbs: Some("40g".into()),
            fats: Some("12g".into()),
        },
        snack1: Meal {
            meal: "Fruit or yogurt".into(),
            calories: "150-200".into(),
            protein: None,
            carbs: None,
            fats: None,
        },
        snack2: Meal {
            meal: "Nuts or protein shake".into(),
            calories: "150-200".into(),
            protein: None,
            carbs: None,
            fats: None,
        },
    };

    let mut workout_plan = BTreeMap::new();
    let mut diet_plan = BTreeMap::new();
    for day in 1..=7 {
        workout_plan.insert(
            format!("day{day}"),
            WorkoutDay {
                exercises: exercises.clone(),
            },
        );
        diet_plan.insert(format!("day{day}"), diet_day.clone());
    }

    Plan {
        workout_plan,
        diet_plan,
        tips: vec![
            "Stay hydrated by drinking at least 8 glasses of water daily".into(),
            "Aim for 7-9 hours of quality sleep each night".into(),
            "Listen to your body and take rest days when needed".into(),
            "Maintain consistency in your workout routine".into(),
            "Combine exercise with proper nutrition for best results".into(),
        ],
        motivation: format!(
            "Great job taking the first step, {}! Your commitment to {} is inspiring. Every step counts! 💪",
            profile.name, profile.fitness_goal
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Alex".into(),
            age: 29,
            gender: "female".into(),
            height: 170.0,
            weight: 65.0,
            fitness_goal: "Muscle Gain".into(),
            fitness_level: "Intermediate".into(),
            workout_location: "Home".into(),
            dietary_preferences: "Vegetarian".into(),
            medical_history: None,
            stress_level: None,
        }
    }

    #[test]
    fn parses_fenced_json_block() {
        let raw = "Here is your plan:\n```json\n{\"tips\":[\"hydrate\"],\"motivation\":\"go\"}\n```\nEnjoy!";
        match extract_plan(raw, &profile()) {
            PlanPayload::Generated(value) => {
                assert_eq!(value["tips"][0], "hydrate");
                assert_eq!(value["motivation"], "go");
                // Missing sections stay absent, they are not auto-filled.
                assert!(value.get("workoutPlan").is_none());
                assert!(value.get("dietPlan").is_none());
            }
            PlanPayload::Fallback(_) => panic!("expected AI-derived plan"),
        }
    }

    #[test]
    fn parses_fence_without_language_tag() {
        let raw = "```\n{\"motivation\":\"push on\"}\n```";
        match extract_plan(raw, &profile()) {
            PlanPayload::Generated(value) => assert_eq!(value["motivation"], "push on"),
            PlanPayload::Fallback(_) => panic!("expected AI-derived plan"),
        }
    }

    #[test]
    fn parses_unfenced_json_surrounded_by_prose() {
        let raw = "Sure thing! {\"workoutPlan\":{},\"motivation\":\"push\"} Good luck with training.";
        match extract_plan(raw, &profile()) {
            PlanPayload::Generated(value) => assert_eq!(value["motivation"], "push"),
            PlanPayload::Fallback(_) => panic!("expected AI-derived plan"),
        }
    }

    #[test]
    fn brace_match_spans_nested_objects() {
        let raw = "prefix {\"a\":{\"b\":{\"c\":1}}} suffix";
        match extract_plan(raw, &profile()) {
            PlanPayload::Generated(value) => assert_eq!(value["a"]["b"]["c"], 1),
            PlanPayload::Fallback(_) => panic!("expected AI-derived plan"),
        }
    }

    #[test]
    fn fenced_block_wins_over_plain_braces() {
        let raw = "{\"outer\":true}\n```json\n{\"inner\":true}\n```";
        match extract_plan(raw, &profile()) {
            PlanPayload::Generated(value) => {
                assert_eq!(value["inner"], true);
                assert!(value.get("outer").is_none());
            }
            PlanPayload::Fallback(_) => panic!("expected AI-derived plan"),
        }
    }

    #[test]
    fn refusal_text_falls_back() {
        let payload = extract_plan("I cannot help with that.", &profile());
        assert!(payload.is_fallback());
        match payload {
            PlanPayload::Fallback(plan) => assert_eq!(plan, fallback_plan(&profile())),
            PlanPayload::Generated(_) => unreachable!(),
        }
    }

    #[test]
    fn truncated_json_falls_back() {
        let raw = "```json\n{\"workoutPlan\": {\"day1\": \n```";
        assert!(extract_plan(raw, &profile()).is_fallback());
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_plan(&profile()), fallback_plan(&profile()));
    }

    #[test]
    fn fallback_covers_all_seven_days() {
        let plan = fallback_plan(&profile());
        assert_eq!(plan.workout_plan.len(), 7);
        assert_eq!(plan.diet_plan.len(), 7);
        for day in 1..=7 {
            let key = format!("day{day}");
            assert!(plan.workout_plan.contains_key(&key), "missing {key}");
            assert!(plan.diet_plan.contains_key(&key), "missing {key}");
        }
        assert_eq!(plan.tips.len(), 5);
    }

    #[test]
    fn fallback_motivation_mentions_name_and_goal() {
        let plan = fallback_plan(&profile());
        assert!(plan.motivation.contains("Alex"));
        assert!(plan.motivation.contains("Muscle Gain"));
    }

    #[test]
    fn fallback_serializes_with_wire_field_names() {
        let value = serde_json::to_value(fallback_plan(&profile())).unwrap();
        assert_eq!(
            value["workoutPlan"]["day1"]["exercises"][0]["name"],
            "Warm-up Cardio"
        );
        assert_eq!(value["dietPlan"]["day3"]["snack1"]["meal"], "Fruit or yogurt");
        // Snacks carry no macro estimates and the keys must be absent, not null.
        assert!(value["dietPlan"]["day1"]["snack1"].get("protein").is_none());
    }

    #[test]
    fn payload_serializes_to_bare_plan_object() {
        let generated = PlanPayload::Generated(serde_json::json!({"tips": ["a"]}));
        assert_eq!(
            serde_json::to_value(&generated).unwrap(),
            serde_json::json!({"tips": ["a"]})
        );
        let fallback = PlanPayload::Fallback(fallback_plan(&profile()));
        let value = serde_json::to_value(&fallback).unwrap();
        assert!(value.get("workoutPlan").is_some());
        assert!(value.get("source").is_none());
    }
}
