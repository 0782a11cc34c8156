//! Database query functions for the `style_preferences` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::StylePreference;

/// Look up a preference by its unique `(category, value)` pair.
pub async fn find_preference<'e>(
    db: impl SqliteExecutor<'e>,
    category: &str,
    value: &str,
) -> Result<Option<StylePreference>> {
    let pref = sqlx::query_as::<_, StylePreference>(
        "SELECT * FROM style_preferences WHERE category = ?1 AND value = ?2",
    )
    .bind(category)
    .bind(value)
    .fetch_optional(db)
    .await
    .context("failed to look up style preference")?;

    Ok(pref)
}

/// Insert a new preference row.
pub async fn insert_preference<'e>(
    db: impl SqliteExecutor<'e>,
    pref: &StylePreference,
) -> Result<StylePreference> {
    let row = sqlx::query_as::<_, StylePreference>(
        "INSERT INTO style_preferences (id, category, value, confidence, source, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         RETURNING *",
    )
    .bind(pref.id)
    .bind(&pref.category)
    .bind(&pref.value)
    .bind(pref.confidence)
    .bind(&pref.source)
    .bind(pref.created_at)
    .bind(pref.updated_at)
    .fetch_one(db)
    .await
    .with_context(|| {
        format!(
            "failed to insert style preference {}={:?}",
            pref.category, pref.value
        )
    })?;

    Ok(row)
}

/// Set the confidence of an existing preference.
pub async fn set_confidence<'e>(
    db: impl SqliteExecutor<'e>,
    id: Uuid,
    confidence: f64,
    updated_at: DateTime<Utc>,
) -> Result<StylePreference> {
    let row = sqlx::query_as::<_, StylePreference>(
        "UPDATE style_preferences SET confidence = ?2, updated_at = ?3 WHERE id = ?1 RETURNING *",
    )
    .bind(id)
    .bind(confidence)
    .bind(updated_at)
    .fetch_optional(db)
    .await
    .context("failed to update style preference confidence")?;

    row.with_context(|| format!("style preference {id} not found"))
}

/// List all preferences ordered by category, highest confidence first.
pub async fn list_preferences<'e>(db: impl SqliteExecutor<'e>) -> Result<Vec<StylePreference>> {
    let prefs = sqlx::query_as::<_, StylePreference>(
        "SELECT * FROM style_preferences ORDER BY category ASC, confidence DESC, value ASC",
    )
    .fetch_all(db)
    .await
    .context("failed to list style preferences")?;

    Ok(prefs)
}
