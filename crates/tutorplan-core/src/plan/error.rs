//! Errors raised at the composer boundary.
//!
//! Every error here is detected before any block is built or allocated; the
//! composer never returns a partial plan.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while validating composer inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    #[error("week count must be a positive whole number, got {value}")]
    InvalidWeekCount { value: i64 },

    #[error("weekly cap must be a finite, non-negative number of minutes, got {0}")]
    NegativeCap(f64),

    #[error("weekly cap of {0} minutes is too large")]
    CapTooLarge(f64),

    #[error("section split must be two non-negative fractions summing to 1.0, got RW={rw}, Math={math}")]
    InvalidSplit { rw: f64, math: f64 },

    #[error("priority for {target} must be between 1 and 5, got {value}")]
    InvalidPriority { target: String, value: i64 },

    #[error("invalid start date {0:?} (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
    InvalidStartDate(String),

    #[error("start date {date} leaves no room for a {retest_days}-day retest interval")]
    StartDateOutOfRange { date: NaiveDate, retest_days: u32 },

    #[error("attempt for topic {topic:?} has unknown mastery level {value:?}")]
    UnknownMastery { topic: String, value: String },

    #[error("attempt for topic {topic:?} has unknown section {value:?}")]
    UnknownSection { topic: String, value: String },
}
