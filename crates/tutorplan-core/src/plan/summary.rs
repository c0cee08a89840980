//! Read-only aggregation over a finished plan, for display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Mastery, Section, StudyPlan};

/// Minutes per section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMinutes {
    #[serde(rename = "RW")]
    pub rw: u64,
    #[serde(rename = "Math")]
    pub math: u64,
}

impl SectionMinutes {
    pub fn get(&self, section: Section) -> u64 {
        match section {
            Section::Rw => self.rw,
            Section::Math => self.math,
        }
    }

    pub fn total(&self) -> u64 {
        self.rw + self.math
    }

    fn add(&mut self, section: Section, minutes: u64) {
        match section {
            Section::Rw => self.rw += minutes,
            Section::Math => self.math += minutes,
        }
    }
}

/// Per-week totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTotals {
    pub week: u32,
    pub blocks: usize,
    pub minutes: u64,
}

/// Aggregate view of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_minutes: SectionMinutes,
    /// Count per mastery level; all five levels are always present.
    pub mastery_distribution: BTreeMap<Mastery, usize>,
    pub total_blocks: usize,
    pub total_practice_items: u64,
    pub weeks: Vec<WeekTotals>,
}

/// Summarize a plan. Depends only on block contents, never on their order.
pub fn summarize_plan(plan: &StudyPlan) -> PlanSummary {
    let mut total_minutes = SectionMinutes::default();
    let mut mastery_distribution: BTreeMap<Mastery, usize> =
        Mastery::ALL.iter().map(|m| (*m, 0)).collect();
    let mut total_practice_items = 0u64;

    for block in plan.blocks() {
        total_minutes.add(block.section, u64::from(block.minutes));
        *mastery_distribution.entry(block.mastery).or_default() += 1;
        total_practice_items += u64::from(block.practice_items);
    }

    let weeks = plan
        .weeks
        .iter()
        .map(|w| WeekTotals {
            week: w.week,
            blocks: w.blocks.len(),
            minutes: w.minutes(),
        })
        .collect();

    PlanSummary {
        total_minutes,
        mastery_distribution,
        total_blocks: plan.block_count(),
        total_practice_items,
        weeks,
    }
}
