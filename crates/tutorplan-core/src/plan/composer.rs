//! The study-plan composer.
//!
//! One call runs validate -> build blocks -> prioritize -> allocate ->
//! assemble. The composer holds nothing but the prescription table, so a
//! single instance can be shared across threads and called concurrently.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::allocate::allocate;
use super::block::{ResourceCatalog, build_block, check_retest_horizon};
use super::error::ComposeError;
use super::prescription::PrescriptionTable;
use super::prioritize::prioritize;
use super::request::{PlanPolicy, PlanRequest};
use super::types::{PlanBlock, PlanMeta, RULES_VERSION, StudyPlan, TopicAttempt};

#[derive(Debug, Clone, Default)]
pub struct PlanComposer {
    prescriptions: PrescriptionTable,
}

impl PlanComposer {
    pub fn new(prescriptions: PrescriptionTable) -> Self {
        Self { prescriptions }
    }

    pub fn prescriptions(&self) -> &PrescriptionTable {
        &self.prescriptions
    }

    /// Compose a plan stamped with the current time.
    pub fn compose(
        &self,
        owner_id: &str,
        attempts: &[TopicAttempt],
        request: &PlanRequest,
        catalog: &ResourceCatalog,
    ) -> Result<StudyPlan, ComposeError> {
        self.compose_at(owner_id, attempts, request, catalog, Utc::now())
    }

    /// Compose a plan with an explicit `generated_at`. Same inputs always
    /// give the same plan.
    pub fn compose_at(
        &self,
        owner_id: &str,
        attempts: &[TopicAttempt],
        request: &PlanRequest,
        catalog: &ResourceCatalog,
        generated_at: DateTime<Utc>,
    ) -> Result<StudyPlan, ComposeError> {
        let policy = request.validate()?;
        check_retest_horizon(policy.start_date, &self.prescriptions)?;
        Ok(self.compose_policy(owner_id, attempts, &policy, catalog, generated_at))
    }

    /// Compose from already validated parameters. Infallible; due dates
    /// saturate if [`check_retest_horizon`] was skipped.
    pub fn compose_policy(
        &self,
        owner_id: &str,
        attempts: &[TopicAttempt],
        policy: &PlanPolicy,
        catalog: &ResourceCatalog,
        generated_at: DateTime<Utc>,
    ) -> StudyPlan {
        let mut blocks: Vec<PlanBlock> = attempts
            .iter()
            .map(|a| build_block(a, policy.start_date, catalog, &self.prescriptions))
            .collect();

        prioritize(&mut blocks, &policy.section_priority, &policy.topic_priority);

        let block_count = blocks.len();
        let allocation = allocate(
            blocks,
            policy.weeks,
            policy.cap_per_week_minutes,
            policy.split,
        );

        debug!(
            owner_id,
            blocks = block_count,
            overflow = allocation.overflow,
            "plan composed"
        );

        StudyPlan {
            owner_id: owner_id.to_owned(),
            weeks: allocation.weeks,
            meta: PlanMeta {
                generated_at,
                cap_per_week_minutes: policy.cap_per_week_minutes,
                rules_version: RULES_VERSION.to_owned(),
                student_name: None,
            },
        }
    }
}

/// Compose with the standard prescription table.
pub fn compose_plan(
    owner_id: &str,
    attempts: &[TopicAttempt],
    request: &PlanRequest,
    catalog: &ResourceCatalog,
) -> Result<StudyPlan, ComposeError> {
    PlanComposer::default().compose(owner_id, attempts, request, catalog)
}

// Compile-time assertion: one composer can be shared across threads.
const _: () = {
    fn _assert_send_sync<T: Send + Sync>() {}
    fn _check() {
        _assert_send_sync::<PlanComposer>();
    }
};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::plan::types::{Mastery, Section};

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn invalid_request_yields_no_plan() {
        let attempts = vec![TopicAttempt::new("s", Section::Rw, "Inferences", Mastery::Developing)];
        let request = PlanRequest::new("2025-09-01").with_weeks(0);
        let result =
            PlanComposer::default().compose_at("s", &attempts, &request, &ResourceCatalog::new(), at());
        assert!(matches!(result, Err(ComposeError::InvalidWeekCount { .. })));
    }

    #[test]
    fn accepts_horizons_beyond_two_years() {
        let attempts = vec![TopicAttempt::new("s", Section::Math, "Circles", Mastery::Mastered)];
        let request = PlanRequest::new("2025-09-01").with_weeks(105);
        let plan = PlanComposer::default()
            .compose_at("s", &attempts, &request, &ResourceCatalog::new(), at())
            .unwrap();
        assert_eq!(plan.weeks.len(), 105);
        assert_eq!(plan.weeks[104].week, 105);
        assert_eq!(plan.block_count(), 1);
    }

    #[test]
    fn start_date_without_room_for_retest_is_rejected() {
        let attempts = vec![TopicAttempt::new("s", Section::Rw, "Inferences", Mastery::Developing)];
        let last_day = NaiveDate::MAX - chrono::Days::new(1);
        let request = PlanRequest::new(last_day.format("%Y-%m-%d").to_string());
        let err = PlanComposer::default()
            .compose_at("s", &attempts, &request, &ResourceCatalog::new(), at())
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::StartDateOutOfRange {
                date: last_day,
                retest_days: 7
            }
        );

        // Seven days is the longest standard interval, so this still fits.
        let roomy = NaiveDate::MAX - chrono::Days::new(7);
        let request = PlanRequest::new(roomy.format("%Y-%m-%d").to_string());
        let plan = PlanComposer::default()
            .compose_at("s", &attempts, &request, &ResourceCatalog::new(), at())
            .unwrap();
        assert_eq!(
            plan.weeks[0].blocks[0].due_date,
            roomy + chrono::Days::new(3)
        );
    }

    #[test]
    fn meta_is_stamped() {
        let plan = PlanComposer::default()
            .compose_at(
                "owner-1",
                &[],
                &PlanRequest::new("2025-09-01").with_cap(240),
                &ResourceCatalog::new(),
                at(),
            )
            .unwrap();
        assert_eq!(plan.owner_id, "owner-1");
        assert_eq!(plan.meta.generated_at, at());
        assert_eq!(plan.meta.cap_per_week_minutes, 240);
        assert_eq!(plan.meta.rules_version, "v1.0");
        assert_eq!(plan.meta.student_name, None);
        assert_eq!(plan.weeks.len(), 3);
    }

    #[test]
    fn custom_table_changes_minutes() {
        let mut table = PrescriptionTable::STANDARD;
        table.unknown.minutes = 5;
        table.unknown.retest_days = 1;
        let attempts = vec![TopicAttempt::new("s", Section::Math, "Circles", Mastery::Unknown)];
        let plan = PlanComposer::new(table)
            .compose_at(
                "s",
                &attempts,
                &PlanRequest::new("2025-09-01"),
                &ResourceCatalog::new(),
                at(),
            )
            .unwrap();
        let block = &plan.weeks[0].blocks[0];
        assert_eq!(block.minutes, 5);
        assert_eq!(block.due_date, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
    }

    #[test]
    fn compose_is_deterministic() {
        let attempts = vec![
            TopicAttempt::new("s", Section::Rw, "Inferences", Mastery::Developing),
            TopicAttempt::new("s", Section::Math, "Circles", Mastery::PriorityGap),
        ];
        let request = PlanRequest::new("2025-09-01");
        let composer = PlanComposer::default();
        let a = composer
            .compose_at("s", &attempts, &request, &ResourceCatalog::new(), at())
            .unwrap();
        let b = composer
            .compose_at("s", &attempts, &request, &ResourceCatalog::new(), at())
            .unwrap();
        assert_eq!(a, b);
    }
}
