//! Week allocator: greedy first-fit into the earliest week with room.
//!
//! Every week carries two independent minute budgets, one per section. A
//! block goes into the first week whose budget for its section covers the
//! block's minutes. A block that fits nowhere is appended to the last week
//! without touching its budget, so no block is ever dropped.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{PlanBlock, Section, WeekSlot};

/// Fraction of the weekly cap given to each section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSplit {
    #[serde(rename = "RW")]
    pub rw: f64,
    #[serde(rename = "Math")]
    pub math: f64,
}

impl SectionSplit {
    /// Tolerance when checking that the two fractions sum to 1.0.
    pub const TOLERANCE: f64 = 1e-6;

    pub fn new(rw: f64, math: f64) -> Self {
        Self { rw, math }
    }

    /// Split giving `rw` to Reading/Writing and the remainder to Math.
    pub fn from_rw(rw: f64) -> Self {
        Self::new(rw, 1.0 - rw)
    }

    pub fn is_valid(&self) -> bool {
        self.rw.is_finite()
            && self.math.is_finite()
            && self.rw >= 0.0
            && self.math >= 0.0
            && (self.rw + self.math - 1.0).abs() <= Self::TOLERANCE
    }
}

impl Default for SectionSplit {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Remaining minutes of one week, per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBudget {
    pub rw: u32,
    pub math: u32,
}

impl WeekBudget {
    /// Budget of a fresh week: `round(cap x split)` per section.
    pub fn from_cap(cap_minutes: u32, split: SectionSplit) -> Self {
        let share = |fraction: f64| (f64::from(cap_minutes) * fraction).round() as u32;
        Self {
            rw: share(split.rw),
            math: share(split.math),
        }
    }

    pub fn remaining(&self, section: Section) -> u32 {
        match section {
            Section::Rw => self.rw,
            Section::Math => self.math,
        }
    }

    /// Deduct `minutes` from the section budget if it covers them.
    fn try_take(&mut self, section: Section, minutes: u32) -> bool {
        let slot = match section {
            Section::Rw => &mut self.rw,
            Section::Math => &mut self.math,
        };
        if *slot >= minutes {
            *slot -= minutes;
            true
        } else {
            false
        }
    }
}

/// Result of allocating a block sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Exactly as many weeks as requested.
    pub weeks: Vec<WeekSlot>,
    /// Number of blocks forced into the last week.
    pub overflow: usize,
}

/// Place every block, in order, into a week.
pub fn allocate(
    blocks: Vec<PlanBlock>,
    weeks: NonZeroU32,
    cap_per_week_minutes: u32,
    split: SectionSplit,
) -> Allocation {
    let week_count = weeks.get() as usize;
    let mut slots: Vec<WeekSlot> = (1..=weeks.get()).map(WeekSlot::new).collect();
    let mut budgets = vec![WeekBudget::from_cap(cap_per_week_minutes, split); week_count];
    let mut overflow = 0usize;

    for block in blocks {
        let target = budgets
            .iter_mut()
            .position(|budget| budget.try_take(block.section, block.minutes));

        match target {
            Some(idx) => slots[idx].blocks.push(block),
            None => {
                overflow += 1;
                slots[week_count - 1].blocks.push(block);
            }
        }
    }

    debug!(weeks = week_count, overflow, "blocks allocated");

    Allocation {
        weeks: slots,
        overflow,
    }
}
