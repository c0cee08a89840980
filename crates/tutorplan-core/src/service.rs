//! Plan service layer.
//!
//! Glues a [`PlanDataSource`] to the composer and persists generated plans
//! as JSONB. The composer stays pure; everything with I/O lives here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use tutorplan_db::models::StoredPlan;
use tutorplan_db::queries::plans as plan_queries;

use crate::plan::{PlanComposer, PlanRequest, StudyPlan};
use crate::source::{PlanDataSource, StudentProfile};

/// The requested student does not exist in the data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("student {0:?} not found")]
pub struct StudentNotFound(pub String);

/// Fill in the student's own priorities wherever the request is silent.
///
/// Section weights come from the profile only when the request gives none.
/// Topic weights are merged, with the request winning per topic.
pub fn apply_profile_priorities(request: &PlanRequest, profile: &StudentProfile) -> PlanRequest {
    let mut merged = request.clone();
    if merged.section_priority.is_none() {
        merged.section_priority = Some(profile.section_priority);
    }
    for (topic, weight) in &profile.topic_priority {
        merged
            .topic_priority
            .entry(topic.clone())
            .or_insert(*weight);
    }
    merged
}

/// Compose a plan for one student from a data source.
///
/// The request is validated before anything is loaded. The returned plan
/// carries the student's display name and uses the student id as owner.
pub async fn generate_for_student(
    source: &dyn PlanDataSource,
    composer: &PlanComposer,
    student_id: &str,
    request: &PlanRequest,
) -> Result<StudyPlan> {
    request.validate()?;

    let profile = source
        .get_student(student_id)
        .await?
        .ok_or_else(|| StudentNotFound(student_id.to_owned()))?;
    let attempts = source
        .attempts_for(student_id)
        .await
        .with_context(|| format!("failed to load attempts for {student_id:?}"))?;
    let catalog = source
        .resource_catalog()
        .await
        .context("failed to load resource catalog")?;

    let request = apply_profile_priorities(request, &profile);
    let plan = composer
        .compose(student_id, &attempts, &request, &catalog)?
        .with_student_name(profile.display_name());

    info!(
        source = source.name(),
        student_id,
        blocks = plan.block_count(),
        weeks = plan.weeks.len(),
        "generated study plan"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// A plan as stored, with its storage id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub plan: StudyPlan,
}

impl TryFrom<StoredPlan> for SavedPlan {
    type Error = anyhow::Error;

    fn try_from(row: StoredPlan) -> Result<Self> {
        let plan: StudyPlan = serde_json::from_value(row.plan)
            .with_context(|| format!("stored plan {} is not a valid study plan", row.id))?;
        Ok(Self {
            id: row.id,
            created_at: row.created_at,
            plan,
        })
    }
}

/// Persist a plan. Returns the new storage id.
pub async fn save_plan(pool: &PgPool, plan: &StudyPlan) -> Result<Uuid> {
    let json = serde_json::to_value(plan).context("failed to serialize study plan")?;
    let stored = plan_queries::insert_plan(
        pool,
        &plan.owner_id,
        plan.meta.student_name.as_deref(),
        &plan.meta.rules_version,
        &json,
    )
    .await?;
    info!(plan_id = %stored.id, owner_id = %plan.owner_id, "saved study plan");
    Ok(stored.id)
}

pub async fn get_saved_plan(pool: &PgPool, id: Uuid) -> Result<Option<SavedPlan>> {
    plan_queries::get_plan(pool, id)
        .await?
        .map(SavedPlan::try_from)
        .transpose()
}

/// Stored plans, newest first, optionally for one owner only.
pub async fn list_saved_plans(pool: &PgPool, owner_id: Option<&str>) -> Result<Vec<SavedPlan>> {
    plan_queries::list_plans(pool, owner_id)
        .await?
        .into_iter()
        .map(SavedPlan::try_from)
        .collect()
}
