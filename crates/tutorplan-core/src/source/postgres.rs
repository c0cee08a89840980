//! [`PlanDataSource`] backed by the tutorplan PostgreSQL database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use tutorplan_db::queries::{attempts as attempt_queries, resources, students};

use super::{PlanDataSource, StudentProfile};
use crate::plan::{ResourceCatalog, TopicAttempt};

#[derive(Debug, Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PlanDataSource for PgDataSource {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn list_students(&self) -> Result<Vec<StudentProfile>> {
        let rows = students::list_tested_students(&self.pool).await?;
        Ok(rows.into_iter().map(StudentProfile::from).collect())
    }

    async fn get_student(&self, id: &str) -> Result<Option<StudentProfile>> {
        Ok(students::get_student(&self.pool, id)
            .await?
            .map(StudentProfile::from))
    }

    async fn attempts_for(&self, student_id: &str) -> Result<Vec<TopicAttempt>> {
        attempt_queries::list_attempts_for_student(&self.pool, student_id)
            .await?
            .into_iter()
            .map(|row| {
                let id = row.id;
                TopicAttempt::try_from(row)
                    .with_context(|| format!("invalid topic attempt row {id}"))
            })
            .collect()
    }

    async fn resource_catalog(&self) -> Result<ResourceCatalog> {
        resources::load_catalog(&self.pool).await
    }
}
