//! Study prescriptions and goal text, keyed by mastery level.
//!
//! The table is an immutable value handed to the composer. Lookups are an
//! exhaustive `match` on [`Mastery`], so a new mastery level fails to compile
//! until it has a prescription and a goal template.

use serde::{Deserialize, Serialize};

use super::types::Mastery;

/// Time and intensity policy for one mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    /// Minutes of study.
    pub minutes: u32,
    /// Number of practice items.
    pub items: u32,
    /// Calendar days from the plan start until the topic is retested.
    pub retest_days: u32,
}

impl Prescription {
    const fn new(minutes: u32, items: u32, retest_days: u32) -> Self {
        Self {
            minutes,
            items,
            retest_days,
        }
    }
}

/// One prescription per mastery level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionTable {
    pub priority_gap: Prescription,
    pub developing: Prescription,
    pub proficient: Prescription,
    pub mastered: Prescription,
    pub unknown: Prescription,
}

impl PrescriptionTable {
    /// The standard policy for rules version `v1.0`.
    pub const STANDARD: Self = Self {
        priority_gap: Prescription::new(90, 16, 2),
        developing: Prescription::new(60, 12, 3),
        proficient: Prescription::new(25, 8, 7),
        mastered: Prescription::new(15, 5, 7),
        unknown: Prescription::new(20, 6, 7),
    };

    /// Look up the prescription for a mastery level.
    pub fn get(&self, mastery: Mastery) -> Prescription {
        match mastery {
            Mastery::PriorityGap => self.priority_gap,
            Mastery::Developing => self.developing,
            Mastery::Proficient => self.proficient,
            Mastery::Mastered => self.mastered,
            Mastery::Unknown => self.unknown,
        }
    }

    /// Longest retest interval across all mastery levels.
    pub fn max_retest_days(&self) -> u32 {
        [
            self.priority_gap,
            self.developing,
            self.proficient,
            self.mastered,
            self.unknown,
        ]
        .iter()
        .map(|p| p.retest_days)
        .max()
        .unwrap_or(0)
    }
}

impl Default for PrescriptionTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Short goal statement for a block.
pub fn goal_for(topic: &str, mastery: Mastery) -> String {
    match mastery {
        Mastery::PriorityGap => format!("Rebuild foundation in {topic} with scaffolded drills"),
        Mastery::Developing => format!("Tighten concepts in {topic} using worked examples"),
        Mastery::Proficient => format!("Light review + mixed practice for {topic}"),
        Mastery::Mastered => format!("Spaced retrieval to cement {topic}"),
        Mastery::Unknown => format!("Sample {topic} to assess level"),
    }
}
