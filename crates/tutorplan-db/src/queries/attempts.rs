//! Database query functions for the `topic_attempts` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::AttemptRow;

/// Record one diagnostic result.
///
/// `section` and `mastery` are written as given; they are validated when the
/// row is read back into a domain attempt.
pub async fn insert_attempt(
    pool: &PgPool,
    student_id: &str,
    section: &str,
    topic: &str,
    mastery: &str,
    created_at: DateTime<Utc>,
) -> Result<AttemptRow> {
    let row = sqlx::query_as::<_, AttemptRow>(
        "INSERT INTO topic_attempts (student_id, section, topic, mastery, created_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(student_id)
    .bind(section)
    .bind(topic)
    .bind(mastery)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert attempt for topic {topic:?}"))?;

    Ok(row)
}

/// List every attempt recorded for a student, in insertion order.
pub async fn list_attempts_for_student(pool: &PgPool, student_id: &str) -> Result<Vec<AttemptRow>> {
    let rows = sqlx::query_as::<_, AttemptRow>(
        "SELECT * FROM topic_attempts WHERE student_id = $1 ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("failed to list attempts")?;

    Ok(rows)
}

/// Remove all attempts for a student. Returns the number of rows deleted.
pub async fn delete_attempts_for_student(pool: &PgPool, student_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM topic_attempts WHERE student_id = $1")
        .bind(student_id)
        .execute(pool)
        .await
        .context("failed to delete attempts")?;

    Ok(result.rows_affected())
}
