use anyhow::{Context, Result, ensure};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::{DbConfig, is_plain_identifier};

/// Migrations embedded at compile time from `crates/tutorplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

// ---------------------------------------------------------------------------
// Pools and migrations
// ---------------------------------------------------------------------------

/// Connect a pool sized by `config`.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(applied = MIGRATOR.iter().count(), "migrations up to date");
    Ok(())
}

/// Connect, then bring the schema up to date. Used by `db-init` and tests.
pub async fn connect_and_migrate(config: &DbConfig) -> Result<PgPool> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

// ---------------------------------------------------------------------------
// Database lifecycle (issued against the maintenance database)
// ---------------------------------------------------------------------------

async fn database_exists(maint: &PgPool, name: &str) -> Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(name)
        .fetch_one(maint)
        .await
        .context("failed to query pg_database")
}

/// `CREATE DATABASE <name>`. The name is spliced into the statement, so it
/// must be a plain identifier.
pub async fn create_database(maint: &PgPool, name: &str) -> Result<()> {
    ensure!(
        is_plain_identifier(name),
        "database name {name:?} contains invalid characters"
    );
    maint
        .execute(format!("CREATE DATABASE {name}").as_str())
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    info!(db = name, "database created");
    Ok(())
}

/// Disconnect every other session on `name`, then drop it if present.
pub async fn drop_database(maint: &PgPool, name: &str) -> Result<()> {
    ensure!(
        is_plain_identifier(name),
        "database name {name:?} contains invalid characters"
    );
    sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(name)
    .execute(maint)
    .await
    .context("failed to terminate connections")?;
    maint
        .execute(format!("DROP DATABASE IF EXISTS {name}").as_str())
        .await
        .with_context(|| format!("failed to drop database {name}"))?;
    debug!(db = name, "database dropped");
    Ok(())
}

/// Create the database named in `config` unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let name = config
        .database_name()
        .context("could not determine database name from URL")?;

    let maint = create_pool(&config.maintenance()).await?;
    let result = match database_exists(&maint, name).await {
        Ok(true) => {
            info!(db = name, "database already exists");
            Ok(())
        }
        Ok(false) => create_database(&maint, name).await,
        Err(e) => Err(e),
    };
    maint.close().await;
    result
}

// ---------------------------------------------------------------------------
// Row counts
// ---------------------------------------------------------------------------

/// Row counts for the tutorplan tables, reported by `db-init`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub students: i64,
    pub topic_attempts: i64,
    pub resources: i64,
    pub study_plans: i64,
}

impl TableCounts {
    /// `(table, rows)` pairs in table-name order.
    pub fn entries(&self) -> [(&'static str, i64); 4] {
        [
            ("resources", self.resources),
            ("students", self.students),
            ("study_plans", self.study_plans),
            ("topic_attempts", self.topic_attempts),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, rows)| *rows == 0)
    }
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts> {
    let (students, topic_attempts, resources, study_plans): (i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT \
               (SELECT COUNT(*) FROM students), \
               (SELECT COUNT(*) FROM topic_attempts), \
               (SELECT COUNT(*) FROM resources), \
               (SELECT COUNT(*) FROM study_plans)",
        )
        .fetch_one(pool)
        .await
        .context("failed to count rows")?;
    Ok(TableCounts {
        students,
        topic_attempts,
        resources,
        study_plans,
    })
}
