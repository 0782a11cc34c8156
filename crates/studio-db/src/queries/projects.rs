//! Database query functions for the `projects` table.

use anyhow::{Context, Result};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{Project, ProjectStatus};

/// Insert a fully-formed project row and return it as stored.
pub async fn insert_project<'e>(db: impl SqliteExecutor<'e>, project: &Project) -> Result<Project> {
    let row = sqlx::query_as::<_, Project>(
        "INSERT INTO projects \
         (id, title, description, status, medium, style, estimated_budget, actual_budget, \
          materials_list, steps, notes, file_path, created_at, updated_at, completed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15) \
         RETURNING *",
    )
    .bind(project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.status)
    .bind(&project.medium)
    .bind(&project.style)
    .bind(project.estimated_budget)
    .bind(project.actual_budget)
    .bind(&project.materials_list)
    .bind(&project.steps)
    .bind(&project.notes)
    .bind(&project.file_path)
    .bind(project.created_at)
    .bind(project.updated_at)
    .bind(project.completed_at)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert project {:?}", project.title))?;

    Ok(row)
}

/// Fetch a project by its ID.
pub async fn get_project<'e>(db: impl SqliteExecutor<'e>, id: Uuid) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch project")?;

    Ok(project)
}

/// List projects, most recently updated first, optionally filtered by status.
pub async fn list_projects<'e>(
    db: impl SqliteExecutor<'e>,
    status: Option<ProjectStatus>,
    limit: i64,
) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT * FROM projects \
         WHERE (?1 IS NULL OR status = ?1) \
         ORDER BY updated_at DESC, rowid DESC \
         LIMIT ?2",
    )
    .bind(status)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to list projects")?;

    Ok(projects)
}

/// Overwrite every mutable column of a project. Returns the stored row, or
/// `None` when the project does not exist.
pub async fn update_project<'e>(db: impl SqliteExecutor<'e>, project: &Project) -> Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(
        "UPDATE projects SET \
           title = ?2, description = ?3, status = ?4, medium = ?5, style = ?6, \
           estimated_budget = ?7, actual_budget = ?8, materials_list = ?9, steps = ?10, \
           notes = ?11, file_path = ?12, updated_at = ?13, completed_at = ?14 \
         WHERE id = ?1 \
         RETURNING *",
    )
    .bind(project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.status)
    .bind(&project.medium)
    .bind(&project.style)
    .bind(project.estimated_budget)
    .bind(project.actual_budget)
    .bind(&project.materials_list)
    .bind(&project.steps)
    .bind(&project.notes)
    .bind(&project.file_path)
    .bind(project.updated_at)
    .bind(project.completed_at)
    .fetch_optional(db)
    .await
    .with_context(|| format!("failed to update project {}", project.id))?;

    Ok(row)
}

/// Record the path a project was exported to.
pub async fn set_file_path<'e>(db: impl SqliteExecutor<'e>, id: Uuid, file_path: &str) -> Result<()> {
    let result = sqlx::query("UPDATE projects SET file_path = ?1 WHERE id = ?2")
        .bind(file_path)
        .bind(id)
        .execute(db)
        .await
        .context("failed to set project file path")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("project {id} not found");
    }

    Ok(())
}

/// Count projects in a given status.
pub async fn count_by_status<'e>(db: impl SqliteExecutor<'e>, status: ProjectStatus) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE status = ?1")
        .bind(status)
        .fetch_one(db)
        .await
        .context("failed to count projects by status")?;

    Ok(count)
}

/// Count all projects.
pub async fn count_projects<'e>(db: impl SqliteExecutor<'e>) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(db)
        .await
        .context("failed to count projects")?;

    Ok(count)
}
