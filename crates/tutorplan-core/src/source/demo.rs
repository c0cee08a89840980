//! In-memory [`PlanDataSource`] serving the embedded demo student.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{PlanDataSource, StudentProfile};
use crate::plan::{ResourceCatalog, TopicAttempt};

static DEMO_TOML: &str = include_str!("demo.toml");

#[derive(Debug, Deserialize)]
struct DemoFile {
    student: StudentProfile,
    #[serde(default)]
    attempts: Vec<TopicAttempt>,
    #[serde(default)]
    resources: ResourceCatalog,
}

/// A single student with a fixed diagnostic and catalog.
#[derive(Debug, Clone)]
pub struct DemoDataSource {
    student: StudentProfile,
    attempts: Vec<TopicAttempt>,
    resources: ResourceCatalog,
}

impl DemoDataSource {
    /// Id of the embedded demo student.
    pub const STUDENT_ID: &'static str = "demo_user_123";

    /// Load the embedded demo data.
    pub fn load() -> Result<Self> {
        Self::from_toml_str(DEMO_TOML).context("embedded demo.toml is invalid")
    }

    /// Parse demo data from TOML. Attempts without a `student_id` are
    /// attributed to the file's student.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: DemoFile = toml::from_str(s).context("failed to parse demo data")?;
        let attempts = file
            .attempts
            .into_iter()
            .map(|mut a| {
                if a.student_id.is_empty() {
                    a.student_id = file.student.id.clone();
                }
                a
            })
            .collect();
        Ok(Self {
            student: file.student,
            attempts,
            resources: file.resources,
        })
    }

    pub fn student(&self) -> &StudentProfile {
        &self.student
    }
}

#[async_trait]
impl PlanDataSource for DemoDataSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn list_students(&self) -> Result<Vec<StudentProfile>> {
        Ok(vec![self.student.clone()])
    }

    async fn get_student(&self, id: &str) -> Result<Option<StudentProfile>> {
        Ok((self.student.id == id).then(|| self.student.clone()))
    }

    async fn attempts_for(&self, student_id: &str) -> Result<Vec<TopicAttempt>> {
        Ok(self
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn resource_catalog(&self) -> Result<ResourceCatalog> {
        Ok(self.resources.clone())
    }
}
