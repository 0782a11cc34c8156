//! Style preferences learned over time.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use studio_db::models::StylePreference;
use studio_db::queries::preferences as db;

use crate::error::{Result, StudioError};

pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_SOURCE: &str = "chat";
/// Added to an existing preference each time it is mentioned again.
pub const REPEAT_BOOST: f64 = 0.1;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPreference {
    pub category: String,
    pub value: String,
    pub confidence: Option<f64>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedPreference {
    pub action: SaveAction,
    pub preference: StylePreference,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileEntry {
    pub value: String,
    pub confidence: f64,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleProfile {
    pub preferences: BTreeMap<String, Vec<ProfileEntry>>,
    pub total_preferences: usize,
}

/// Record a preference. A repeat of an existing `(category, value)` pair
/// raises its confidence by [`REPEAT_BOOST`], capped at 1.0.
pub async fn save_style_preference(pool: &SqlitePool, new: NewPreference) -> Result<SavedPreference> {
    let category = new.category.trim();
    let value = new.value.trim();
    if category.is_empty() || value.is_empty() {
        return Err(StudioError::validation(
            "preference category and value are required",
        ));
    }

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let saved = match db::find_preference(&mut *tx, category, value).await? {
        Some(existing) => {
            let confidence = (existing.confidence + REPEAT_BOOST).min(1.0);
            let preference = db::set_confidence(&mut *tx, existing.id, confidence, now).await?;
            SavedPreference {
                action: SaveAction::Updated,
                preference,
            }
        }
        None => {
            let confidence = new.confidence.unwrap_or(DEFAULT_CONFIDENCE);
            if !(0.0..=1.0).contains(&confidence) {
                return Err(StudioError::validation(
                    "confidence must be between 0 and 1",
                ));
            }
            let preference = db::insert_preference(
                &mut *tx,
                &StylePreference {
                    id: Uuid::new_v4(),
                    category: category.to_string(),
                    value: value.to_string(),
                    confidence,
                    source: new.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?;
            SavedPreference {
                action: SaveAction::Created,
                preference,
            }
        }
    };
    tx.commit().await?;

    debug!(
        category,
        value,
        confidence = saved.preference.confidence,
        action = ?saved.action,
        "saved style preference"
    );
    Ok(saved)
}

/// All preferences grouped by category, highest confidence first.
pub async fn style_profile(pool: &SqlitePool) -> Result<StyleProfile> {
    let prefs = db::list_preferences(pool).await?;
    let total_preferences = prefs.len();

    let mut preferences: BTreeMap<String, Vec<ProfileEntry>> = BTreeMap::new();
    for pref in prefs {
        preferences.entry(pref.category).or_default().push(ProfileEntry {
            value: pref.value,
            confidence: pref.confidence,
            source: pref.source,
        });
    }
    for entries in preferences.values_mut() {
        entries.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }

    Ok(StyleProfile {
        preferences,
        total_preferences,
    })
}
