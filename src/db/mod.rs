use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A persisted plan. `user_data` and `plan` are opaque JSONB blobs; the
/// store never looks inside them.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlan {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub user_data: serde_json::Value,
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_plan(
    pool: &PgPool,
    user_id: Option<&str>,
    user_data: &serde_json::Value,
    plan: &serde_json::Value,
) -> Result<StoredPlan> {
    let stored = sqlx::query_as::<_, StoredPlan>(
        r#"
        INSERT INTO plans (id, user_id, user_data, plan)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, user_data, plan, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(user_data)
    .bind(plan)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

pub async fn list_plans(pool: &PgPool, user_id: Option<&str>) -> Result<Vec<StoredPlan>> {
    let plans = match user_id {
        Some(user_id) => {
            sqlx::query_as::<_, StoredPlan>(
                r#"
                SELECT id, user_id, user_data, plan, created_at
                FROM plans
                WHERE user_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, StoredPlan>(
                r#"
                SELECT id, user_id, user_data, plan, created_at
                FROM plans
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(plans)
}

pub async fn find_plan_by_id(pool: &PgPool, id: Uuid) -> Result<Option<StoredPlan>> {
    let plan = sqlx::query_as::<_, StoredPlan>(
        r#"
        SELECT id, user_id, user_data, plan, created_at
        FROM plans
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(plan)
}
