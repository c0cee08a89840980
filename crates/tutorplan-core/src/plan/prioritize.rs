//! Prioritizer: the single place where block order is decided.
//!
//! Blocks are stable-sorted on a composite key, most significant first:
//!
//! 1. mastery severity rank (gaps first);
//! 2. section weight, higher first;
//! 3. topic weight (default 3), higher first;
//! 4. topic name, ascending.
//!
//! Blocks equal on every key keep their input order.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{PlanBlock, Section};

/// A validated priority weight in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const DEFAULT: Priority = Priority(3);

    /// Returns `None` if `value` is outside `1..=5`.
    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Priority {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("priority must be between 1 and 5, got {value}"))
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> Self {
        i64::from(p.0)
    }
}

/// Weight per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionPriority {
    pub rw: Priority,
    pub math: Priority,
}

impl SectionPriority {
    pub fn new(rw: Priority, math: Priority) -> Self {
        Self { rw, math }
    }

    pub fn get(&self, section: Section) -> Priority {
        match section {
            Section::Rw => self.rw,
            Section::Math => self.math,
        }
    }
}

/// Weight per topic. Topics without an entry weigh [`Priority::DEFAULT`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicPriority(HashMap<String, Priority>);

impl TopicPriority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic: impl Into<String>, priority: Priority) {
        self.0.insert(topic.into(), priority);
    }

    pub fn get(&self, topic: &str) -> Priority {
        self.0.get(topic).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Priority)> for TopicPriority {
    fn from_iter<I: IntoIterator<Item = (String, Priority)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Compare topic names the way a human-facing alphabetical list does:
/// case-insensitive first, and on a case-only difference lowercase sorts
/// before uppercase.
pub fn compare_topic_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Full ordering between two blocks.
pub fn compare_blocks(
    a: &PlanBlock,
    b: &PlanBlock,
    sections: &SectionPriority,
    topics: &TopicPriority,
) -> Ordering {
    a.mastery
        .severity_rank()
        .cmp(&b.mastery.severity_rank())
        .then_with(|| sections.get(b.section).cmp(&sections.get(a.section)))
        .then_with(|| topics.get(&b.topic).cmp(&topics.get(&a.topic)))
        .then_with(|| compare_topic_names(&a.topic, &b.topic))
}

/// Stable-sort blocks into scheduling order.
pub fn prioritize(blocks: &mut [PlanBlock], sections: &SectionPriority, topics: &TopicPriority) {
    blocks.sort_by(|a, b| compare_blocks(a, b, sections, topics));
}
