//! Database query functions for the `students` table.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::models::Student;

/// Fields required to register a student.
#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub rw_priority: i16,
    pub math_priority: i16,
    pub topic_priority: &'a HashMap<String, i16>,
    pub session_length_min: i32,
    pub strengths: Option<&'a str>,
    pub gaps: Option<&'a str>,
}

/// Insert a student, or update the profile if the id already exists.
pub async fn upsert_student(pool: &PgPool, new: &NewStudent<'_>) -> Result<Student> {
    let student = sqlx::query_as::<_, Student>(
        "INSERT INTO students \
             (id, first_name, last_name, rw_priority, math_priority, topic_priority, \
              session_length_min, strengths, gaps) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO UPDATE SET \
             first_name = EXCLUDED.first_name, \
             last_name = EXCLUDED.last_name, \
             rw_priority = EXCLUDED.rw_priority, \
             math_priority = EXCLUDED.math_priority, \
             topic_priority = EXCLUDED.topic_priority, \
             session_length_min = EXCLUDED.session_length_min, \
             strengths = EXCLUDED.strengths, \
             gaps = EXCLUDED.gaps \
         RETURNING *",
    )
    .bind(new.id)
    .bind(new.first_name)
    .bind(new.last_name)
    .bind(new.rw_priority)
    .bind(new.math_priority)
    .bind(Json(new.topic_priority))
    .bind(new.session_length_min)
    .bind(new.strengths)
    .bind(new.gaps)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert student {:?}", new.id))?;

    Ok(student)
}

/// Fetch a student by id.
pub async fn get_student(pool: &PgPool, id: &str) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch student")?;

    Ok(student)
}

/// List students that have at least one recorded attempt, ordered by name.
pub async fn list_tested_students(pool: &PgPool) -> Result<Vec<Student>> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT s.* FROM students s \
         WHERE EXISTS (SELECT 1 FROM topic_attempts a WHERE a.student_id = s.id) \
         ORDER BY s.last_name, s.first_name, s.id",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tested students")?;

    Ok(students)
}
