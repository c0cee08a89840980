//! Database query functions for the `study_plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::StoredPlan;

/// Insert a serialized plan. Returns the stored row with server-generated
/// defaults (id, created_at).
pub async fn insert_plan(
    pool: &PgPool,
    owner_id: &str,
    student_name: Option<&str>,
    rules_version: &str,
    plan: &serde_json::Value,
) -> Result<StoredPlan> {
    let stored = sqlx::query_as::<_, StoredPlan>(
        "INSERT INTO study_plans (owner_id, student_name, rules_version, plan) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(student_name)
    .bind(rules_version)
    .bind(plan)
    .fetch_one(pool)
    .await
    .context("failed to insert study plan")?;

    Ok(stored)
}

/// Fetch a stored plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<StoredPlan>> {
    let plan = sqlx::query_as::<_, StoredPlan>("SELECT * FROM study_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch study plan")?;

    Ok(plan)
}

/// List stored plans, newest first, optionally restricted to one owner.
pub async fn list_plans(pool: &PgPool, owner_id: Option<&str>) -> Result<Vec<StoredPlan>> {
    let plans = sqlx::query_as::<_, StoredPlan>(
        "SELECT * FROM study_plans \
         WHERE $1::text IS NULL OR owner_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list study plans")?;

    Ok(plans)
}
