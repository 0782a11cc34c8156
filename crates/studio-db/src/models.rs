use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when parsing an invalid status or role string.
#[derive(Debug, Clone, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    InProgress,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError {
                kind: "project status",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Status of a portfolio piece: sketch -> wip -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PieceStatus {
    Sketch,
    Wip,
    Completed,
}

impl fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sketch => "sketch",
            Self::Wip => "wip",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for PieceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sketch" => Ok(Self::Sketch),
            "wip" => Ok(Self::Wip),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError {
                kind: "piece status",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

// ---------------------------------------------------------------------------
// Structured column payloads
// ---------------------------------------------------------------------------

/// One entry of a project's materials list.
///
/// Accepts either `{"name": .., "category": ..}` or a bare string on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Material {
    pub fn new(name: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            name: name.into(),
            category: category.map(str::to_owned),
        }
    }
}

impl<'de> Deserialize<'de> for Material {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(String),
            Full {
                #[serde(default)]
                name: String,
                #[serde(default)]
                category: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(name) => Material {
                name,
                category: None,
            },
            Repr::Full { name, category } => Material { name, category },
        })
    }
}

/// One step in a project plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step: u32,
    pub description: String,
}

/// A progress snapshot attached to a portfolio piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressImage {
    pub path: String,
    pub description: Option<String>,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// An art supply with a fractional remaining-quantity gauge.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supply {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    /// 1.0 = full, 0.5 = half, 0.0 = empty.
    pub quantity: f64,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded consumption of a supply.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupplyUsage {
    pub id: Uuid,
    pub supply_id: Uuid,
    pub project_id: Option<Uuid>,
    pub quantity_used: f64,
    pub used_at: DateTime<Utc>,
}

/// An art project plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub estimated_budget: Option<f64>,
    pub actual_budget: Option<f64>,
    pub materials_list: Json<Vec<Material>>,
    pub steps: Json<Vec<Step>>,
    pub notes: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// An artwork in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioPiece {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
    pub status: PieceStatus,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub image_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub progress_images: Json<Vec<ProgressImage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A style preference inferred from chat or stated explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StylePreference {
    pub id: Uuid,
    pub category: String,
    pub value: String,
    pub confidence: f64,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted chat message.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_status_display_roundtrip() {
        for v in [
            ProjectStatus::Planned,
            ProjectStatus::InProgress,
            ProjectStatus::Completed,
        ] {
            let parsed: ProjectStatus = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn project_status_invalid() {
        let err = "archived".parse::<ProjectStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid project status: \"archived\"");
    }

    #[test]
    fn piece_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&PieceStatus::Wip).unwrap(), "\"wip\"");
        assert!("done".parse::<PieceStatus>().is_err());
    }

    #[test]
    fn material_accepts_bare_string_and_object() {
        let materials: Vec<Material> =
            serde_json::from_str(r#"["Cadmium Yellow", {"name": "Round Brush", "category": "brush"}]"#)
                .unwrap();
        assert_eq!(materials[0], Material::new("Cadmium Yellow", None));
        assert_eq!(materials[1], Material::new("Round Brush", Some("brush")));
    }

    #[test]
    fn material_without_category_omits_field() {
        let json = serde_json::to_value(Material::new("Gesso", None)).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Gesso"}));
    }
}
