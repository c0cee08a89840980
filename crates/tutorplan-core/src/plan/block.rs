//! Block builder: one topic attempt becomes one scheduled block.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use super::error::ComposeError;
use super::prescription::{PrescriptionTable, goal_for};
use super::types::{PlanBlock, TopicAttempt};

/// Topic name -> ordered resource identifiers.
pub type ResourceCatalog = HashMap<String, Vec<String>>;

/// Placeholder resource used when the catalog has nothing for a topic.
pub fn placeholder_slug(topic: &str) -> String {
    format!("TBD:{topic}")
}

/// Resolve the resources for a topic. Never returns an empty list.
pub fn resource_slugs_for(topic: &str, catalog: &ResourceCatalog) -> Vec<String> {
    match catalog.get(topic) {
        Some(slugs) if !slugs.is_empty() => slugs.clone(),
        _ => vec![placeholder_slug(topic)],
    }
}

/// Fail if some retest interval in `prescriptions` would push a due date
/// past the last representable calendar day.
pub fn check_retest_horizon(
    start_date: NaiveDate,
    prescriptions: &PrescriptionTable,
) -> Result<(), ComposeError> {
    let retest_days = prescriptions.max_retest_days();
    match start_date.checked_add_days(Days::new(u64::from(retest_days))) {
        Some(_) => Ok(()),
        None => Err(ComposeError::StartDateOutOfRange {
            date: start_date,
            retest_days,
        }),
    }
}

/// Build the block for a single attempt.
///
/// The due date is `start_date` plus the prescription's retest interval in
/// calendar days. It saturates at `NaiveDate::MAX`; the composer rejects
/// start dates that would get there (see [`check_retest_horizon`]).
pub fn build_block(
    attempt: &TopicAttempt,
    start_date: NaiveDate,
    catalog: &ResourceCatalog,
    prescriptions: &PrescriptionTable,
) -> PlanBlock {
    let prescription = prescriptions.get(attempt.mastery);
    let due_date = start_date
        .checked_add_days(Days::new(u64::from(prescription.retest_days)))
        .unwrap_or(NaiveDate::MAX);

    PlanBlock {
        section: attempt.section,
        topic: attempt.topic.clone(),
        mastery: attempt.mastery,
        minutes: prescription.minutes,
        practice_items: prescription.items,
        resource_slugs: resource_slugs_for(&attempt.topic, catalog),
        due_date,
        goal: goal_for(&attempt.topic, attempt.mastery),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::types::{Mastery, Section};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn priority_gap_block() {
        let attempt = TopicAttempt::new("s1", Section::Math, "Circles", Mastery::PriorityGap);
        let block = build_block(
            &attempt,
            start(),
            &ResourceCatalog::new(),
            &PrescriptionTable::STANDARD,
        );

        assert_eq!(block.section, Section::Math);
        assert_eq!(block.topic, "Circles");
        assert_eq!(block.minutes, 90);
        assert_eq!(block.practice_items, 16);
        assert_eq!(block.due_date, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());
        assert_eq!(
            block.goal,
            "Rebuild foundation in Circles with scaffolded drills"
        );
    }

    #[test]
    fn due_date_crosses_month_boundary() {
        let attempt = TopicAttempt::new("s1", Section::Rw, "Inferences", Mastery::Mastered);
        let block = build_block(
            &attempt,
            NaiveDate::from_ymd_opt(2025, 2, 25).unwrap(),
            &ResourceCatalog::new(),
            &PrescriptionTable::STANDARD,
        );
        assert_eq!(block.due_date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn catalog_slugs_are_used_in_order() {
        let mut catalog = ResourceCatalog::new();
        catalog.insert(
            "Inferences".to_owned(),
            vec!["rw-inference-strategies".to_owned(), "rw-inference-practice".to_owned()],
        );
        let attempt = TopicAttempt::new("s1", Section::Rw, "Inferences", Mastery::Proficient);
        let block = build_block(&attempt, start(), &catalog, &PrescriptionTable::STANDARD);
        assert_eq!(
            block.resource_slugs,
            vec!["rw-inference-strategies", "rw-inference-practice"]
        );
    }

    #[test]
    fn missing_catalog_entry_uses_placeholder() {
        let attempt = TopicAttempt::new("s1", Section::Rw, "Transitions", Mastery::Unknown);
        let block = build_block(
            &attempt,
            start(),
            &ResourceCatalog::new(),
            &PrescriptionTable::STANDARD,
        );
        assert_eq!(block.resource_slugs, vec!["TBD:Transitions"]);
    }

    #[test]
    fn empty_catalog_entry_uses_placeholder() {
        let mut catalog = ResourceCatalog::new();
        catalog.insert("Transitions".to_owned(), Vec::new());
        let attempt = TopicAttempt::new("s1", Section::Rw, "Transitions", Mastery::Unknown);
        let block = build_block(&attempt, start(), &catalog, &PrescriptionTable::STANDARD);
        assert_eq!(block.resource_slugs, vec!["TBD:Transitions"]);
    }

    #[test]
    fn custom_prescription_table_is_honoured() {
        let mut table = PrescriptionTable::STANDARD;
        table.developing.minutes = 45;
        let attempt = TopicAttempt::new("s1", Section::Math, "Percentages", Mastery::Developing);
        let block = build_block(&attempt, start(), &ResourceCatalog::new(), &table);
        assert_eq!(block.minutes, 45);
        assert_eq!(block.practice_items, 12);
    }

    #[test]
    fn retest_horizon_uses_longest_interval() {
        let table = PrescriptionTable::STANDARD;
        assert!(check_retest_horizon(start(), &table).is_ok());
        assert!(check_retest_horizon(NaiveDate::MAX - Days::new(7), &table).is_ok());
        assert_eq!(
            check_retest_horizon(NaiveDate::MAX - Days::new(6), &table).unwrap_err(),
            ComposeError::StartDateOutOfRange {
                date: NaiveDate::MAX - Days::new(6),
                retest_days: 7
            }
        );

        let mut long = table;
        long.mastered.retest_days = 30;
        assert!(check_retest_horizon(NaiveDate::MAX - Days::new(7), &long).is_err());
    }
}
