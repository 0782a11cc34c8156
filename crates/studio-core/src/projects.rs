//! Project plans: CRUD, file export and session notes.

use anyhow::Context;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use studio_db::models::{Material, Project, ProjectStatus, Step};
use studio_db::queries::projects as db;

use crate::error::{Result, StudioError};
use crate::storage::StorageLayout;

/// Default page size for [`list_projects`].
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Version stamped into exported project files.
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

const MAX_SAFE_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub estimated_budget: Option<f64>,
    #[serde(default)]
    pub materials_list: Vec<Material>,
    #[serde(default)]
    pub steps: Vec<Step>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub estimated_budget: Option<f64>,
    pub actual_budget: Option<f64>,
    pub materials_list: Option<Vec<Material>>,
    pub steps: Option<Vec<Step>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectList {
    pub count: usize,
    pub projects: Vec<Project>,
}

/// Result of [`export_project`].
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub file_path: String,
    pub project: Project,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    schema_version: u32,
    #[serde(flatten)]
    project: &'a Project,
    exported_at: chrono::DateTime<Utc>,
}

pub async fn list_projects(
    pool: &SqlitePool,
    status: Option<ProjectStatus>,
    limit: Option<i64>,
) -> Result<ProjectList> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 0 {
        return Err(StudioError::validation("limit must not be negative"));
    }
    let projects = db::list_projects(pool, status, limit).await?;
    Ok(ProjectList {
        count: projects.len(),
        projects,
    })
}

pub async fn get_project(pool: &SqlitePool, id: Uuid) -> Result<Project> {
    db::get_project(pool, id)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))
}

/// Create a project in the `planned` state.
pub async fn create_project(pool: &SqlitePool, new: NewProject) -> Result<Project> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(StudioError::validation("project title is required"));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: new.description,
        status: ProjectStatus::Planned,
        medium: new.medium,
        style: new.style,
        estimated_budget: new.estimated_budget,
        actual_budget: None,
        materials_list: Json(new.materials_list),
        steps: Json(new.steps),
        notes: new.notes,
        file_path: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    };

    let stored = db::insert_project(pool, &project).await?;
    info!(project_id = %stored.id, title = %stored.title, "created project");
    Ok(stored)
}

/// Apply a patch. `completed_at` is stamped on the first transition into
/// `completed` and never moved afterwards.
pub async fn update_project(pool: &SqlitePool, id: Uuid, patch: ProjectPatch) -> Result<Project> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(StudioError::validation("project title cannot be empty"));
    }

    let mut tx = pool.begin().await?;
    let mut project = db::get_project(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))?;
    let now = Utc::now();

    if let Some(title) = patch.title {
        project.title = title.trim().to_string();
    }
    if let Some(status) = patch.status {
        if status == ProjectStatus::Completed && project.completed_at.is_none() {
            project.completed_at = Some(now);
        }
        project.status = status;
    }
    if patch.description.is_some() {
        project.description = patch.description;
    }
    if patch.medium.is_some() {
        project.medium = patch.medium;
    }
    if patch.style.is_some() {
        project.style = patch.style;
    }
    if patch.estimated_budget.is_some() {
        project.estimated_budget = patch.estimated_budget;
    }
    if patch.actual_budget.is_some() {
        project.actual_budget = patch.actual_budget;
    }
    if let Some(materials) = patch.materials_list {
        project.materials_list = Json(materials);
    }
    if let Some(steps) = patch.steps {
        project.steps = Json(steps);
    }
    if patch.notes.is_some() {
        project.notes = patch.notes;
    }
    project.updated_at = now;

    let stored = db::update_project(&mut *tx, &project)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))?;
    tx.commit().await?;

    info!(project_id = %id, status = %stored.status, "updated project");
    Ok(stored)
}

/// Filesystem-safe form of a project title.
///
/// Keeps alphanumerics, spaces, `-` and `_`; trims; spaces become `_`;
/// at most 50 characters. Falls back to `project` when nothing survives.
pub fn safe_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe: String = kept
        .trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_SAFE_TITLE_CHARS)
        .collect();
    if safe.is_empty() {
        "project".to_string()
    } else {
        safe
    }
}

/// Write the project as pretty JSON under `<data>/projects/` and record the
/// path on the project.
pub async fn export_project(
    pool: &SqlitePool,
    storage: &StorageLayout,
    id: Uuid,
) -> Result<ExportReport> {
    let project = get_project(pool, id).await?;

    let dir = storage.projects_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let filename = format!(
        "{}_{}.json",
        safe_title(&project.title),
        Local::now().format("%Y%m%d")
    );
    let path = dir.join(filename);

    let document = ExportDocument {
        schema_version: EXPORT_SCHEMA_VERSION,
        project: &project,
        exported_at: Utc::now(),
    };
    let body = serde_json::to_string_pretty(&document).context("failed to encode project")?;
    tokio::fs::write(&path, body).await?;

    let file_path = path.to_string_lossy().into_owned();
    db::set_file_path(pool, id, &file_path).await?;
    info!(project_id = %id, path = %file_path, "exported project");

    let project = get_project(pool, id).await?;
    Ok(ExportReport { file_path, project })
}

/// Append timestamped notes, separated from earlier notes by a blank line.
pub async fn add_session_notes(pool: &SqlitePool, id: Uuid, notes: &str) -> Result<Project> {
    if notes.trim().is_empty() {
        return Err(StudioError::validation("notes cannot be empty"));
    }

    let mut tx = pool.begin().await?;
    let mut project = db::get_project(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))?;

    project.notes = Some(append_note(
        project.notes.as_deref(),
        &Local::now().format("%Y-%m-%d %H:%M").to_string(),
        notes,
    ));
    project.updated_at = Utc::now();

    let stored = db::update_project(&mut *tx, &project)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))?;
    tx.commit().await?;
    Ok(stored)
}

fn append_note(existing: Option<&str>, timestamp: &str, notes: &str) -> String {
    let entry = format!("[{timestamp}]\n{notes}");
    match existing {
        Some(prev) if !prev.is_empty() => format!("{prev}\n\n{entry}"),
        _ => entry,
    }
}
