//! Query functions, one module per table.

pub mod attempts;
pub mod plans;
pub mod resources;
pub mod students;
