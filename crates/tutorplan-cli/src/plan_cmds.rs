//! CLI handlers for stored plans and plan files.
//!
//! Implements:
//! - `tutorplan plan list [--owner]`  -- list stored plans
//! - `tutorplan plan show <plan-id>`  -- print one stored plan
//! - `tutorplan summarize <file>`     -- summarize a plan JSON file

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use tutorplan_core::plan::{StudyPlan, summarize_plan};
use tutorplan_core::service::{self, SavedPlan};

use crate::PlanCommands;
use crate::compose_cmd::{OutputFormat, format_plan};
use crate::render;

// -----------------------------------------------------------------------
// Public entry points
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::List { owner } => cmd_list(pool, owner.as_deref()).await,
        PlanCommands::Show { plan_id, format } => cmd_show(pool, &plan_id, format).await,
    }
}

/// Print the summary of a plan stored as JSON on disk.
pub fn run_summarize(file: &Path, format: OutputFormat) -> Result<()> {
    let plan = read_plan_file(file)?;
    let summary = summarize_plan(&plan);
    match format {
        OutputFormat::Text => print!("{}", render::render_summary(&summary)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
        ),
    }
    Ok(())
}

pub fn read_plan_file(file: &Path) -> Result<StudyPlan> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read plan file: {}", file.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse plan file: {}", file.display()))
}

// -----------------------------------------------------------------------
// tutorplan plan list
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool, owner: Option<&str>) -> Result<()> {
    let plans = service::list_saved_plans(pool, owner).await?;

    if plans.is_empty() {
        println!("No plans found. Use `tutorplan compose --save` to store one.");
        return Ok(());
    }

    print!("{}", render_plan_table(&plans));
    Ok(())
}

fn render_plan_table(plans: &[SavedPlan]) -> String {
    // ID is always 36 chars (UUID).
    let id_w = 36;
    let owner_w = plans
        .iter()
        .map(|p| p.plan.owner_id.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let blocks_w = 6;

    let mut out = format!(
        "{:<id_w$}  {:<owner_w$}  {:>blocks_w$}  WEEKS  CREATED\n",
        "ID", "OWNER", "BLOCKS",
    );
    for saved in plans {
        out.push_str(&format!(
            "{:<id_w$}  {:<owner_w$}  {:>blocks_w$}  {:>5}  {}\n",
            saved.id,
            saved.plan.owner_id,
            saved.plan.block_count(),
            saved.plan.weeks.len(),
            saved.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// tutorplan plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id_str: &str, format: OutputFormat) -> Result<()> {
    let plan_id: Uuid = plan_id_str
        .parse()
        .with_context(|| format!("invalid plan ID: {plan_id_str:?}"))?;

    let saved = service::get_saved_plan(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;

    if format == OutputFormat::Text {
        println!("Stored plan {}", saved.id);
        println!(
            "  Saved:        {}",
            saved.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    print!("{}", format_plan(&saved.plan, format)?);
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use tutorplan_core::plan::{
        Mastery, PlanComposer, PlanRequest, ResourceCatalog, Section, TopicAttempt,
    };

    use super::*;

    fn plan(owner: &str) -> StudyPlan {
        PlanComposer::default()
            .compose(
                owner,
                &[TopicAttempt::new(owner, Section::Rw, "Purpose", Mastery::Developing)],
                &PlanRequest::new("2025-09-01").with_weeks(2),
                &ResourceCatalog::new(),
            )
            .unwrap()
    }

    #[test]
    fn plan_table_lists_each_plan() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let saved = SavedPlan {
            id,
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 12, 30, 0).unwrap(),
            plan: plan("student_001"),
        };
        let table = render_plan_table(&[saved]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("550e8400-e29b-41d4-a716-446655440000"));
        assert!(lines[1].contains("student_001"));
        assert!(lines[1].ends_with("2025-09-01 12:30"));
    }

    #[test]
    fn read_plan_file_parses_composed_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.json");
        let original = plan("s1");
        std::fs::write(&path, serde_json::to_string(&original).unwrap()).unwrap();

        let loaded = read_plan_file(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn read_plan_file_reports_bad_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.json");
        std::fs::write(&path, "{\"owner_id\": 7}").unwrap();

        let err = read_plan_file(&path).unwrap_err();
        assert!(
            err.to_string().contains("failed to parse plan file"),
            "unexpected error: {err}"
        );
    }
}
