use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Subject section of the test. Each section has its own weekly budget.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text")]
pub enum Section {
    /// Reading and Writing.
    #[sqlx(rename = "RW")]
    #[serde(rename = "RW")]
    Rw,
    #[sqlx(rename = "Math")]
    #[serde(rename = "Math")]
    Math,
}

impl Section {
    /// Both sections, in display order.
    pub const ALL: [Section; 2] = [Section::Rw, Section::Math];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rw => "RW",
            Self::Math => "Math",
        };
        f.write_str(s)
    }
}

impl FromStr for Section {
    type Err = SectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RW" => Ok(Self::Rw),
            "Math" => Ok(Self::Math),
            other => Err(SectionParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Section`] string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid section: {0:?} (expected RW or Math)")]
pub struct SectionParseError(pub String);

// ---------------------------------------------------------------------------

/// Diagnostic mastery level of a topic.
///
/// Variants are declared in severity order: gaps first, unknown last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mastery {
    PriorityGap,
    Developing,
    Proficient,
    Mastered,
    Unknown,
}

impl Mastery {
    /// The closed enumeration, in severity order.
    pub const ALL: [Mastery; 5] = [
        Mastery::PriorityGap,
        Mastery::Developing,
        Mastery::Proficient,
        Mastery::Mastered,
        Mastery::Unknown,
    ];

    /// Severity rank used as the primary scheduling key (0 = most urgent).
    pub fn severity_rank(self) -> u8 {
        match self {
            Self::PriorityGap => 0,
            Self::Developing => 1,
            Self::Proficient => 2,
            Self::Mastered => 3,
            Self::Unknown => 4,
        }
    }
}

impl fmt::Display for Mastery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PriorityGap => "PRIORITY_GAP",
            Self::Developing => "DEVELOPING",
            Self::Proficient => "PROFICIENT",
            Self::Mastered => "MASTERED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl FromStr for Mastery {
    type Err = MasteryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIORITY_GAP" => Ok(Self::PriorityGap),
            "DEVELOPING" => Ok(Self::Developing),
            "PROFICIENT" => Ok(Self::Proficient),
            "MASTERED" => Ok(Self::Mastered),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(MasteryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Mastery`] string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mastery level: {0:?}")]
pub struct MasteryParseError(pub String);

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A student who has taken the diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Section weights, 1-5.
    pub rw_priority: i16,
    pub math_priority: i16,
    /// Topic name -> weight (1-5), stored as JSONB.
    pub topic_priority: sqlx::types::Json<std::collections::HashMap<String, i16>>,
    pub session_length_min: i32,
    pub strengths: Option<String>,
    pub gaps: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A raw diagnostic result as stored.
///
/// `section` and `mastery` are kept as text so that rows written by other
/// systems with unexpected values are rejected when converted, not when
/// fetched.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub student_id: String,
    pub section: String,
    pub topic: String,
    pub mastery: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the resource catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub topic: String,
    pub slug: String,
    pub position: i32,
}

/// A generated plan persisted for later retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredPlan {
    pub id: Uuid,
    pub owner_id: String,
    pub student_name: Option<String>,
    pub rules_version: String,
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_display_roundtrip() {
        for v in &Section::ALL {
            let s = v.to_string();
            let parsed: Section = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn section_invalid() {
        let err = "Science".parse::<Section>().unwrap_err();
        assert_eq!(err, SectionParseError("Science".to_owned()));
    }

    #[test]
    fn section_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Section::Rw).unwrap(), "\"RW\"");
        assert_eq!(serde_json::to_string(&Section::Math).unwrap(), "\"Math\"");
        let parsed: Section = serde_json::from_str("\"RW\"").unwrap();
        assert_eq!(parsed, Section::Rw);
    }

    #[test]
    fn mastery_display_roundtrip() {
        for v in &Mastery::ALL {
            let s = v.to_string();
            let parsed: Mastery = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn mastery_invalid() {
        assert!("EXPERT".parse::<Mastery>().is_err());
        assert!("priority_gap".parse::<Mastery>().is_err());
    }

    #[test]
    fn mastery_serde_matches_display() {
        for v in &Mastery::ALL {
            let json = serde_json::to_string(v).unwrap();
            assert_eq!(json, format!("\"{v}\""));
        }
    }

    #[test]
    fn severity_rank_follows_declaration_order() {
        let ranks: Vec<u8> = Mastery::ALL.iter().map(|m| m.severity_rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }
}
