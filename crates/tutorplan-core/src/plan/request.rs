//! Policy parameters for one composer call.
//!
//! [`PlanRequest`] is the loosely typed input (JSON body, CLI flags, config
//! defaults). [`PlanRequest::validate`] turns it into a [`PlanPolicy`] whose
//! fields can no longer be out of range, so the block builder and the
//! allocator never see a bad parameter.

use std::collections::HashMap;
use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::allocate::SectionSplit;
use super::error::ComposeError;
use super::prioritize::{Priority, SectionPriority, TopicPriority};

/// Default plan horizon in weeks.
pub const DEFAULT_WEEKS: i64 = 3;
/// Default weekly time cap in minutes.
pub const DEFAULT_CAP_MINUTES: f64 = 360.0;

fn default_weeks() -> i64 {
    DEFAULT_WEEKS
}

fn default_cap() -> f64 {
    DEFAULT_CAP_MINUTES
}

/// Raw section weights as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionWeights {
    #[serde(rename = "RW")]
    pub rw: i64,
    #[serde(rename = "Math")]
    pub math: i64,
}

impl SectionWeights {
    pub fn new(rw: i64, math: i64) -> Self {
        Self { rw, math }
    }

    pub fn validate(&self) -> Result<SectionPriority, ComposeError> {
        Ok(SectionPriority::new(
            check_priority("section RW", self.rw)?,
            check_priority("section Math", self.math)?,
        ))
    }
}

impl Default for SectionWeights {
    fn default() -> Self {
        let d = i64::from(Priority::DEFAULT);
        Self::new(d, d)
    }
}

fn check_priority(target: &str, value: i64) -> Result<Priority, ComposeError> {
    Priority::new(value).ok_or_else(|| ComposeError::InvalidPriority {
        target: target.to_owned(),
        value,
    })
}

/// Unvalidated policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
    pub start_date: String,
    #[serde(default = "default_weeks")]
    pub weeks: i64,
    /// Minutes per week; fractional values round to the nearest minute.
    #[serde(default = "default_cap", alias = "cap_per_week")]
    pub cap_per_week_minutes: f64,
    #[serde(default)]
    pub section_split: SectionSplit,
    /// `None` means "not specified"; validates to weight 3 for both sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_priority: Option<SectionWeights>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub topic_priority: HashMap<String, i64>,
}

impl PlanRequest {
    /// A request with every parameter at its default.
    pub fn new(start_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            weeks: DEFAULT_WEEKS,
            cap_per_week_minutes: DEFAULT_CAP_MINUTES,
            section_split: SectionSplit::default(),
            section_priority: None,
            topic_priority: HashMap::new(),
        }
    }

    pub fn with_weeks(mut self, weeks: i64) -> Self {
        self.weeks = weeks;
        self
    }

    pub fn with_cap(mut self, minutes: impl Into<f64>) -> Self {
        self.cap_per_week_minutes = minutes.into();
        self
    }

    pub fn with_split(mut self, split: SectionSplit) -> Self {
        self.section_split = split;
        self
    }

    pub fn with_section_priority(mut self, rw: i64, math: i64) -> Self {
        self.section_priority = Some(SectionWeights::new(rw, math));
        self
    }

    pub fn with_topic_priority(mut self, topic: impl Into<String>, weight: i64) -> Self {
        self.topic_priority.insert(topic.into(), weight);
        self
    }

    /// Check every parameter and produce the typed policy.
    pub fn validate(&self) -> Result<PlanPolicy, ComposeError> {
        let start_date = parse_start_date(&self.start_date)?;

        let weeks = u32::try_from(self.weeks)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(ComposeError::InvalidWeekCount { value: self.weeks })?;

        let cap_per_week_minutes = cap_minutes(self.cap_per_week_minutes)?;

        if !self.section_split.is_valid() {
            return Err(ComposeError::InvalidSplit {
                rw: self.section_split.rw,
                math: self.section_split.math,
            });
        }

        let section_priority = self.section_priority.unwrap_or_default().validate()?;

        let mut topic_priority = TopicPriority::new();
        for (topic, weight) in &self.topic_priority {
            topic_priority.insert(topic.clone(), check_priority(topic, *weight)?);
        }

        Ok(PlanPolicy {
            start_date,
            weeks,
            cap_per_week_minutes,
            split: self.section_split,
            section_priority,
            topic_priority,
        })
    }
}

/// Round a weekly cap to whole minutes, the same way section budgets round.
fn cap_minutes(raw: f64) -> Result<u32, ComposeError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(ComposeError::NegativeCap(raw));
    }
    let rounded = raw.round();
    if rounded > f64::from(u32::MAX) {
        return Err(ComposeError::CapTooLarge(raw));
    }
    Ok(rounded as u32)
}

/// Parse a plan start date from `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_start_date(raw: &str) -> Result<NaiveDate, ComposeError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| ComposeError::InvalidStartDate(raw.to_owned()))
}

/// Validated policy parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPolicy {
    pub start_date: NaiveDate,
    pub weeks: NonZeroU32,
    pub cap_per_week_minutes: u32,
    pub split: SectionSplit,
    pub section_priority: SectionPriority,
    pub topic_priority: TopicPriority,
}
