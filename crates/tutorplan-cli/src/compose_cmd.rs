//! `tutorplan compose`: build a study plan from an attempts file, a student
//! in the database, or the embedded demo student.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, ValueEnum};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use tutorplan_core::catalog::TopicCatalog;
use tutorplan_core::plan::{
    PlanComposer, PlanRequest, ResourceCatalog, SectionSplit, StudyPlan, TopicAttempt,
};
use tutorplan_core::service;
use tutorplan_core::source::{DemoDataSource, PgDataSource};
use tutorplan_db::pool;

use crate::config::{PlannerSection, TutorplanConfig};
use crate::render;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Attempts file (.toml or .json)
    #[arg(long, conflicts_with_all = ["student", "demo"])]
    pub attempts: Option<PathBuf>,
    /// Student ID to load from the database (or from the demo data with --demo)
    #[arg(long)]
    pub student: Option<String>,
    /// Use the embedded demo student instead of the database
    #[arg(long)]
    pub demo: bool,
    /// First day of the plan (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<String>,
    /// Number of weeks
    #[arg(long)]
    pub weeks: Option<i64>,
    /// Weekly time cap in minutes
    #[arg(long)]
    pub cap: Option<f64>,
    /// Fraction of the weekly cap for Reading/Writing (0.0-1.0)
    #[arg(long)]
    pub rw_split: Option<f64>,
    /// Owner ID stamped on the plan (defaults to the student ID)
    #[arg(long)]
    pub owner: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Write the plan to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Store the generated plan in the database
    #[arg(long)]
    pub save: bool,
}

/// On-disk attempts file.
///
/// Either a bare JSON array of attempts, or a table with an `attempts` list
/// and optional `owner_id`, `student_name` and `resources` catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttemptsFile {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    pub attempts: Vec<TopicAttempt>,
    #[serde(default)]
    pub resources: ResourceCatalog,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttemptsJson {
    List(Vec<TopicAttempt>),
    File(AttemptsFile),
}

/// Read an attempts file; the format follows the extension.
pub fn load_attempts_file(path: &Path) -> Result<AttemptsFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempts file: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let parsed: AttemptsJson = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON from {}", path.display()))?;
        Ok(match parsed {
            AttemptsJson::List(attempts) => AttemptsFile {
                attempts,
                ..AttemptsFile::default()
            },
            AttemptsJson::File(file) => file,
        })
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse TOML from {}", path.display()))
    }
}

/// Merge CLI flags over the configured planner defaults.
pub fn build_request(args: &ComposeArgs, planner: &PlannerSection) -> PlanRequest {
    let start_date = args
        .start_date
        .clone()
        .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string());
    let split = args
        .rw_split
        .map(SectionSplit::from_rw)
        .unwrap_or_else(|| planner.split());

    PlanRequest::new(start_date)
        .with_weeks(args.weeks.unwrap_or(planner.weeks))
        .with_cap(args.cap.unwrap_or(planner.cap_per_week_minutes))
        .with_split(split)
}

/// Compose from an attempts file. Topics are checked against the catalog.
pub fn compose_from_file(
    path: &Path,
    request: &PlanRequest,
    owner: Option<&str>,
) -> Result<StudyPlan> {
    let file = load_attempts_file(path)?;
    TopicCatalog::load()
        .validate_attempts(&file.attempts)
        .with_context(|| format!("invalid attempts in {}", path.display()))?;

    let owner_id = owner
        .map(str::to_owned)
        .or(file.owner_id)
        .or_else(|| file.attempts.first().map(|a| a.student_id.clone()))
        .filter(|id| !id.is_empty())
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "anonymous".to_owned());

    let plan = PlanComposer::default().compose(&owner_id, &file.attempts, request, &file.resources)?;
    Ok(match file.student_name {
        Some(name) => plan.with_student_name(name),
        None => plan,
    })
}

/// Render a plan in the requested format.
pub fn format_plan(plan: &StudyPlan, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render::render_plan(plan)),
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(plan).context("failed to serialize plan")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write to `output`, or stdout when `None`.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write to {}", path.display()))?;
            eprintln!("Plan written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

pub async fn run_compose(args: ComposeArgs, cli_db_url: Option<&str>) -> Result<()> {
    let resolved = TutorplanConfig::resolve(cli_db_url)?;
    let request = build_request(&args, &resolved.planner);
    let composer = PlanComposer::default();

    let mut db_pool: Option<PgPool> = None;

    let mut plan = if let Some(path) = &args.attempts {
        compose_from_file(path, &request, args.owner.as_deref())?
    } else if args.demo {
        let demo = DemoDataSource::load()?;
        let student = args.student.as_deref().unwrap_or(DemoDataSource::STUDENT_ID);
        service::generate_for_student(&demo, &composer, student, &request).await?
    } else if let Some(student) = &args.student {
        let p = pool::create_pool(&resolved.db_config).await?;
        let source = PgDataSource::new(p.clone());
        db_pool = Some(p);
        service::generate_for_student(&source, &composer, student, &request).await?
    } else {
        bail!("nothing to compose: pass --attempts <file>, --student <id> or --demo");
    };

    if args.attempts.is_none() {
        if let Some(owner) = &args.owner {
            plan.owner_id = owner.clone();
        }
    }

    info!(owner_id = %plan.owner_id, blocks = plan.block_count(), "plan composed");

    if args.save {
        let p = match db_pool.take() {
            Some(p) => p,
            None => pool::create_pool(&resolved.db_config).await?,
        };
        let result = service::save_plan(&p, &plan).await;
        p.close().await;
        let id = result?;
        eprintln!("Plan saved with ID {id}");
    } else if let Some(p) = db_pool.take() {
        p.close().await;
    }

    let content = format_plan(&plan, args.format)?;
    write_output(&content, args.output.as_deref())
}
