//! PostgreSQL storage for students, diagnostic attempts, the resource
//! catalog and generated study plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
