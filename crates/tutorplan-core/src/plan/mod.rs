//! Study-plan composition: attempts in, a week-by-week schedule out.

pub mod allocate;
pub mod block;
pub mod composer;
pub mod error;
pub mod prescription;
pub mod prioritize;
pub mod request;
pub mod summary;
pub mod types;

pub use allocate::{Allocation, SectionSplit, WeekBudget, allocate};
pub use block::{ResourceCatalog, build_block, check_retest_horizon, placeholder_slug};
pub use composer::{PlanComposer, compose_plan};
pub use error::ComposeError;
pub use prescription::{Prescription, PrescriptionTable, goal_for};
pub use prioritize::{Priority, SectionPriority, TopicPriority, prioritize};
pub use request::{PlanPolicy, PlanRequest, SectionWeights, parse_start_date};
pub use summary::{PlanSummary, SectionMinutes, WeekTotals, summarize_plan};
pub use types::{
    Mastery, PlanBlock, PlanMeta, RULES_VERSION, Section, StudyPlan, TopicAttempt, WeekSlot,
};
