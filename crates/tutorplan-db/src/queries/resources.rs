//! Database query functions for the `resources` catalog.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::Resource;

/// Add a resource slug to a topic. Re-adding an existing slug updates its
/// position.
pub async fn upsert_resource(pool: &PgPool, topic: &str, slug: &str, position: i32) -> Result<()> {
    sqlx::query(
        "INSERT INTO resources (topic, slug, position) VALUES ($1, $2, $3) \
         ON CONFLICT (topic, slug) DO UPDATE SET position = EXCLUDED.position",
    )
    .bind(topic)
    .bind(slug)
    .bind(position)
    .execute(pool)
    .await
    .with_context(|| format!("failed to upsert resource {slug:?} for {topic:?}"))?;

    Ok(())
}

/// List all resources ordered by topic, then position.
pub async fn list_resources(pool: &PgPool) -> Result<Vec<Resource>> {
    let rows = sqlx::query_as::<_, Resource>(
        "SELECT topic, slug, position FROM resources ORDER BY topic, position, slug",
    )
    .fetch_all(pool)
    .await
    .context("failed to list resources")?;

    Ok(rows)
}

/// Load the whole catalog as topic -> ordered slugs.
pub async fn load_catalog(pool: &PgPool) -> Result<HashMap<String, Vec<String>>> {
    let mut catalog: HashMap<String, Vec<String>> = HashMap::new();
    for row in list_resources(pool).await? {
        catalog.entry(row.topic).or_default().push(row.slug);
    }
    Ok(catalog)
}
