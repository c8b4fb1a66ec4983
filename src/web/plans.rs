use crate::db;
use crate::state::SharedState;
use crate::web::error_response;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePlanRequest {
    #[serde(default)]
    user_id: Option<String>,
    user_data: serde_json::Value,
    plan: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    user_id: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/plans", post(save_plan).get(list_plans))
        .route("/plans/:id", get(get_plan))
        .with_state(state)
}

async fn save_plan(
    State(state): State<SharedState>,
    Json(req): Json<SavePlanRequest>,
) -> Result<Json<db::StoredPlan>, (StatusCode, Json<serde_json::Value>)> {
    let stored = db::insert_plan(&state.pool, req.user_id.as_deref(), &req.user_data, &req.plan)
        .await
        .map_err(|err| {
            tracing::error!("failed to save plan: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save plan")
        })?;
    Ok(Json(stored))
}

async fn list_plans(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<db::StoredPlan>>, (StatusCode, Json<serde_json::Value>)> {
    let plans = db::list_plans(&state.pool, query.user_id.as_deref())
        .await
        .map_err(|err| {
            tracing::error!("failed to fetch plans: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch plans")
        })?;
    Ok(Json(plans))
}

async fn get_plan(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::StoredPlan>, (StatusCode, Json<serde_json::Value>)> {
    let plan = db::find_plan_by_id(&state.pool, id)
        .await
        .map_err(|err| {
            tracing::error!("failed to fetch plan {}: {}", id, err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch plan")
        })?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Plan not found"))?;
    Ok(Json(plan))
}
