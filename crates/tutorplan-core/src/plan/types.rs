//! Plan data model: attempts in, blocks grouped into weeks out.
//!
//! These types are the JSON wire format of a study plan. Field names match
//! what the admin frontend consumes (`owner_id`, `weeks[].blocks[]`,
//! `meta.rules_version`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use tutorplan_db::models::{Mastery, Section};
use tutorplan_db::models::AttemptRow;

use super::error::ComposeError;

/// Rules-version tag stamped on every generated plan.
pub const RULES_VERSION: &str = "v1.0";

/// One recorded diagnostic outcome for a student on a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAttempt {
    #[serde(default)]
    pub student_id: String,
    pub section: Section,
    pub topic: String,
    pub mastery: Mastery,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl TopicAttempt {
    pub fn new(
        student_id: impl Into<String>,
        section: Section,
        topic: impl Into<String>,
        mastery: Mastery,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            section,
            topic: topic.into(),
            mastery,
            created_at: DateTime::<Utc>::default(),
        }
    }
}

impl TryFrom<AttemptRow> for TopicAttempt {
    type Error = ComposeError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let section = row
            .section
            .parse::<Section>()
            .map_err(|e| ComposeError::UnknownSection {
                topic: row.topic.clone(),
                value: e.0,
            })?;
        let mastery = row
            .mastery
            .parse::<Mastery>()
            .map_err(|e| ComposeError::UnknownMastery {
                topic: row.topic.clone(),
                value: e.0,
            })?;
        Ok(Self {
            student_id: row.student_id,
            section,
            topic: row.topic,
            mastery,
            created_at: row.created_at,
        })
    }
}

/// One scheduled unit of study work derived from an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanBlock {
    pub section: Section,
    pub topic: String,
    pub mastery: Mastery,
    pub minutes: u32,
    pub practice_items: u32,
    /// Never empty; falls back to a `TBD:<topic>` placeholder.
    pub resource_slugs: Vec<String>,
    pub due_date: NaiveDate,
    pub goal: String,
}

/// A week of the plan and the blocks assigned to it, in allocation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSlot {
    /// 1-based week number.
    pub week: u32,
    pub blocks: Vec<PlanBlock>,
}

impl WeekSlot {
    pub fn new(week: u32) -> Self {
        Self {
            week,
            blocks: Vec::new(),
        }
    }

    /// Total minutes scheduled in this week.
    pub fn minutes(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.minutes)).sum()
    }

    /// Minutes scheduled in this week for one section.
    pub fn section_minutes(&self, section: Section) -> u64 {
        self.blocks
            .iter()
            .filter(|b| b.section == section)
            .map(|b| u64::from(b.minutes))
            .sum()
    }
}

/// Plan-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub generated_at: DateTime<Utc>,
    pub cap_per_week_minutes: u32,
    pub rules_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

/// A complete study plan. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub owner_id: String,
    pub weeks: Vec<WeekSlot>,
    pub meta: PlanMeta,
}

impl StudyPlan {
    /// Attach the student's display name to the metadata.
    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        self.meta.student_name = Some(name.into());
        self
    }

    /// All blocks in plan order (week by week, allocation order within a week).
    pub fn blocks(&self) -> impl Iterator<Item = &PlanBlock> {
        self.weeks.iter().flat_map(|w| w.blocks.iter())
    }

    pub fn block_count(&self) -> usize {
        self.weeks.iter().map(|w| w.blocks.len()).sum()
    }
}
