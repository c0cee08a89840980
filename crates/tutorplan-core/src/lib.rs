//! Study-plan composition for tutorplan.
//!
//! [`plan`] holds the pure composer. [`catalog`] and [`source`] supply its
//! inputs, and [`service`] wires sources, composer and storage together.

pub mod catalog;
pub mod plan;
pub mod service;
pub mod source;

pub use catalog::{CatalogError, TopicCatalog};
pub use plan::{ComposeError, PlanComposer, PlanRequest, StudyPlan, compose_plan, summarize_plan};
pub use source::{DemoDataSource, PgDataSource, PlanDataSource, StudentProfile};
