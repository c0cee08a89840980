//! Where the composer's inputs come from.
//!
//! A [`PlanDataSource`] supplies students, their attempts and the resource
//! catalog. Every implementation feeds the same composer; the demo source
//! differs only in the data it returns.

pub mod demo;
pub mod postgres;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tutorplan_db::models::Student;

use crate::plan::{ResourceCatalog, SectionWeights, TopicAttempt};

pub use demo::DemoDataSource;
pub use postgres::PgDataSource;

/// A tested student as shown in pickers and used for plan defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub section_priority: SectionWeights,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub topic_priority: HashMap<String, i64>,
    pub session_length_min: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaps: Option<String>,
}

impl StudentProfile {
    /// "First Last", skipping whichever part is blank.
    pub fn display_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Student> for StudentProfile {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            first_name: s.first_name,
            last_name: s.last_name,
            section_priority: SectionWeights::new(
                i64::from(s.rw_priority),
                i64::from(s.math_priority),
            ),
            topic_priority: s
                .topic_priority
                .0
                .into_iter()
                .map(|(topic, weight)| (topic, i64::from(weight)))
                .collect(),
            session_length_min: s.session_length_min,
            strengths: s.strengths,
            gaps: s.gaps,
        }
    }
}

/// Read access to everything a plan is composed from.
///
/// This trait is object-safe so the CLI and the HTTP server can hold a
/// `Box<dyn PlanDataSource>` chosen at startup.
#[async_trait]
pub trait PlanDataSource: Send + Sync {
    /// Short name for logs (e.g. "postgres", "demo").
    fn name(&self) -> &str;

    /// Students with at least one recorded attempt.
    async fn list_students(&self) -> Result<Vec<StudentProfile>>;

    async fn get_student(&self, id: &str) -> Result<Option<StudentProfile>>;

    /// All attempts for a student, in recording order.
    ///
    /// Fails if a stored attempt carries a mastery level or section the
    /// composer does not know.
    async fn attempts_for(&self, student_id: &str) -> Result<Vec<TopicAttempt>>;

    /// Topic -> ordered resource slugs.
    async fn resource_catalog(&self) -> Result<ResourceCatalog>;
}

// Compile-time assertion: PlanDataSource must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanDataSource) {}
};

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;

    fn profile(first: &str, last: &str) -> StudentProfile {
        StudentProfile {
            id: "s1".to_owned(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            section_priority: SectionWeights::default(),
            topic_priority: HashMap::new(),
            session_length_min: 60,
            strengths: None,
            gaps: None,
        }
    }

    #[test]
    fn display_name_joins_parts() {
        assert_eq!(profile("Alex", "Johnson").display_name(), "Alex Johnson");
        assert_eq!(profile("Alex", " ").display_name(), "Alex");
        assert_eq!(profile("", "Johnson").display_name(), "Johnson");
    }

    #[test]
    fn profile_from_student_row() {
        let row = Student {
            id: "s9".to_owned(),
            first_name: "Emma".to_owned(),
            last_name: "Davis".to_owned(),
            rw_priority: 2,
            math_priority: 5,
            topic_priority: Json(HashMap::from([("Circles".to_owned(), 4)])),
            session_length_min: 45,
            strengths: Some("geometry".to_owned()),
            gaps: None,
            created_at: Utc::now(),
        };
        let p = StudentProfile::from(row);
        assert_eq!(p.section_priority, SectionWeights::new(2, 5));
        assert_eq!(p.topic_priority.get("Circles"), Some(&4));
        assert_eq!(p.display_name(), "Emma Davis");
    }

    #[test]
    fn profile_json_shape() {
        let json = serde_json::to_value(profile("Alex", "Johnson")).unwrap();
        assert_eq!(json["section_priority"]["RW"], 3);
        assert_eq!(json["first_name"], "Alex");
        assert!(json.get("strengths").is_none());
    }
}
