//! Topic catalog: the fixed list of diagnostic topics per section.
//!
//! The lists are defined in `topics.toml` and embedded in the binary at
//! compile time. The composer accepts any topic name; callers that take
//! attempts from outside (files, HTTP bodies) check them here first.

use std::sync::LazyLock;

use serde::Deserialize;
use thiserror::Error;

use crate::plan::{Section, TopicAttempt};

/// Errors raised when attempts do not match the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown topic {0:?}")]
    UnknownTopic(String),

    #[error("topic {topic:?} belongs to section {expected}, not {actual}")]
    SectionMismatch {
        topic: String,
        expected: Section,
        actual: Section,
    },
}

/// Topic names per section, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicCatalog {
    #[serde(rename = "RW")]
    rw: Vec<String>,
    #[serde(rename = "Math")]
    math: Vec<String>,
}

/// The embedded topic list.
static TOPICS_TOML: &str = include_str!("topics.toml");

static CATALOG: LazyLock<TopicCatalog> = LazyLock::new(|| {
    TopicCatalog::from_toml_str(TOPICS_TOML).expect("embedded topics.toml is invalid")
});

impl TopicCatalog {
    /// The embedded catalog, parsed once.
    ///
    /// # Panics
    ///
    /// Panics on first use if the embedded TOML is malformed. If the binary
    /// was built and its tests pass, it is not.
    pub fn load() -> &'static TopicCatalog {
        &CATALOG
    }

    /// Parse a catalog from TOML with `RW` and `Math` arrays.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn topics(&self, section: Section) -> &[String] {
        match section {
            Section::Rw => &self.rw,
            Section::Math => &self.math,
        }
    }

    /// Section a topic belongs to, if it is in the catalog.
    pub fn section_of(&self, topic: &str) -> Option<Section> {
        Section::ALL
            .into_iter()
            .find(|s| self.topics(*s).iter().any(|t| t == topic))
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.section_of(topic).is_some()
    }

    /// Check one attempt against the catalog.
    pub fn validate_attempt(&self, attempt: &TopicAttempt) -> Result<(), CatalogError> {
        match self.section_of(&attempt.topic) {
            None => Err(CatalogError::UnknownTopic(attempt.topic.clone())),
            Some(expected) if expected != attempt.section => Err(CatalogError::SectionMismatch {
                topic: attempt.topic.clone(),
                expected,
                actual: attempt.section,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Check every attempt; stops at the first mismatch.
    pub fn validate_attempts(&self, attempts: &[TopicAttempt]) -> Result<(), CatalogError> {
        attempts.iter().try_for_each(|a| self.validate_attempt(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Mastery;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = TopicCatalog::load();
        assert_eq!(catalog.topics(Section::Rw).len(), 14);
        assert_eq!(catalog.topics(Section::Math).len(), 19);
    }

    #[test]
    fn sections_do_not_overlap() {
        let catalog = TopicCatalog::load();
        for topic in catalog.topics(Section::Rw) {
            assert!(
                !catalog.topics(Section::Math).contains(topic),
                "{topic} listed in both sections"
            );
        }
    }

    #[test]
    fn section_lookup() {
        let catalog = TopicCatalog::load();
        assert_eq!(catalog.section_of("Inferences"), Some(Section::Rw));
        assert_eq!(catalog.section_of("Circles"), Some(Section::Math));
        assert_eq!(
            catalog.section_of("Standard English Conventions – Punctuation"),
            Some(Section::Rw)
        );
        assert_eq!(catalog.section_of("Astronomy"), None);
        assert!(!catalog.contains("circles"));
    }

    #[test]
    fn validate_attempts_reports_problems() {
        let catalog = TopicCatalog::load();
        let good = TopicAttempt::new("s", Section::Math, "Percentages", Mastery::Developing);
        assert!(catalog.validate_attempts(std::slice::from_ref(&good)).is_ok());

        let unknown = TopicAttempt::new("s", Section::Math, "Astronomy", Mastery::Developing);
        assert_eq!(
            catalog.validate_attempts(&[good.clone(), unknown]),
            Err(CatalogError::UnknownTopic("Astronomy".to_owned()))
        );

        let wrong_section = TopicAttempt::new("s", Section::Rw, "Percentages", Mastery::Developing);
        assert_eq!(
            catalog.validate_attempt(&wrong_section),
            Err(CatalogError::SectionMismatch {
                topic: "Percentages".to_owned(),
                expected: Section::Math,
                actual: Section::Rw,
            })
        );
    }

    #[test]
    fn custom_catalog_from_toml() {
        let catalog = TopicCatalog::from_toml_str("RW = [\"A\"]\nMath = [\"B\", \"C\"]\n").unwrap();
        assert_eq!(catalog.topics(Section::Math), ["B", "C"]);
        assert!(TopicCatalog::from_toml_str("RW = [\"A\"]").is_err());
    }
}
