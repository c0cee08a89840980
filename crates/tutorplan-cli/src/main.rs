mod compose_cmd;
mod config;
mod plan_cmds;
mod render;
mod serve_cmd;
mod student_cmds;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use tutorplan_core::source::{DemoDataSource, PgDataSource, PlanDataSource};
use tutorplan_db::pool;

use compose_cmd::{ComposeArgs, OutputFormat};
use config::TutorplanConfig;

#[derive(Parser)]
#[command(name = "tutorplan", about = "Study-plan composer for tutoring students")]
struct Cli {
    /// Database URL (overrides TUTORPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a tutorplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/tutorplan")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the tutorplan database (requires config file or env vars)
    DbInit,
    /// Compose a study plan
    Compose(ComposeArgs),
    /// Summarize a plan JSON file
    Summarize {
        /// Path to a plan produced by `compose --format json`
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List tested students
    Students {
        /// Use the embedded demo student instead of the database
        #[arg(long)]
        demo: bool,
    },
    /// Stored plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Start the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Serve the embedded demo student instead of the database
        #[arg(long)]
        demo: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List stored plans
    List {
        /// Only plans for this owner
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show a stored plan
    Show {
        /// Plan ID to show
        plan_id: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Execute the `tutorplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        planner: config::PlannerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  planner       = {} weeks, {} min/week, RW split {}",
        cfg.planner.weeks, cfg.planner.cap_per_week_minutes, cfg.planner.rw_split
    );
    println!();
    println!("Next: run `tutorplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `tutorplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = TutorplanConfig::resolve(cli_db_url)?;

    println!("Initializing tutorplan database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect and run migrations.
    let db_pool = pool::connect_and_migrate(&resolved.db_config).await?;

    // 3. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, rows) in counts.entries() {
        println!("  {table}: {rows} rows");
    }
    if counts.is_empty() {
        println!("No students yet. Load diagnostic results before composing plans.");
    }

    db_pool.close().await;

    println!("tutorplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Compose(args) => {
            compose_cmd::run_compose(args, cli.database_url.as_deref()).await?;
        }
        Commands::Summarize { file, format } => {
            plan_cmds::run_summarize(&file, format)?;
        }
        Commands::Students { demo: true } => {
            let demo = DemoDataSource::load()?;
            student_cmds::run_students(&demo).await?;
        }
        Commands::Students { demo: false } => {
            let resolved = TutorplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let source = PgDataSource::new(db_pool.clone());
            let result = student_cmds::run_students(&source).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = TutorplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port, demo } => {
            let resolved = TutorplanConfig::resolve(cli.database_url.as_deref())?;
            let (source, db_pool) = if demo {
                let source: Arc<dyn PlanDataSource> = Arc::new(DemoDataSource::load()?);
                (source, None)
            } else {
                let db_pool = pool::create_pool(&resolved.db_config).await?;
                let source: Arc<dyn PlanDataSource> =
                    Arc::new(PgDataSource::new(db_pool.clone()));
                (source, Some(db_pool))
            };
            let state = serve_cmd::AppState::new(source, db_pool.clone(), resolved.planner);
            let result = serve_cmd::run_serve(state, &bind, port).await;
            if let Some(p) = db_pool {
                p.close().await;
            }
            result?;
        }
    }

    Ok(())
}
