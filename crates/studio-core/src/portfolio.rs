//! Portfolio of finished and in-progress artwork, with image files kept
//! under the data directory.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use studio_db::models::{PieceStatus, PortfolioPiece, ProgressImage};
use studio_db::queries::{portfolio as db, projects as project_db};

use crate::error::{Result, StudioError};
use crate::storage::{StorageLayout, check_image_source, copy_into, secure_basename, stamped_name};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
const RECENT_COMPLETED: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPiece {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
    pub status: Option<PieceStatus>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    /// Source image to copy into the portfolio.
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PiecePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PieceStatus>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub project_id: Option<Uuid>,
    /// Replacement image to copy into the portfolio.
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PiecesByStatus {
    pub sketch: Vec<PortfolioPiece>,
    pub wip: Vec<PortfolioPiece>,
    pub completed: Vec<PortfolioPiece>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    pub sketches: usize,
    pub works_in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioListing {
    pub total: usize,
    pub pieces: Vec<PortfolioPiece>,
    pub by_status: PiecesByStatus,
    pub summary: PortfolioSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub piece: PortfolioPiece,
    pub progress_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub title: String,
    pub files_removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub sketch: usize,
    pub wip: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedEntry {
    pub id: Uuid,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WipEntry {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioStats {
    pub total_pieces: usize,
    pub by_status: StatusCounts,
    pub by_medium: BTreeMap<String, usize>,
    pub recent_completed: Vec<CompletedEntry>,
    pub active_wips: Vec<WipEntry>,
}

pub async fn list_portfolio(
    pool: &SqlitePool,
    status: Option<PieceStatus>,
    medium: Option<&str>,
    limit: Option<i64>,
) -> Result<PortfolioListing> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 0 {
        return Err(StudioError::validation("limit must not be negative"));
    }
    let pieces = db::list_pieces(pool, status, medium, limit).await?;

    let mut by_status = PiecesByStatus::default();
    for piece in &pieces {
        let bucket = match piece.status {
            PieceStatus::Sketch => &mut by_status.sketch,
            PieceStatus::Wip => &mut by_status.wip,
            PieceStatus::Completed => &mut by_status.completed,
        };
        bucket.push(piece.clone());
    }
    let summary = PortfolioSummary {
        sketches: by_status.sketch.len(),
        works_in_progress: by_status.wip.len(),
        completed: by_status.completed.len(),
    };

    Ok(PortfolioListing {
        total: pieces.len(),
        pieces,
        by_status,
        summary,
    })
}

pub async fn get_piece(pool: &SqlitePool, id: Uuid) -> Result<PortfolioPiece> {
    db::get_piece(pool, id)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))
}

/// Copy `source` into the portfolio directory under a fresh stamped name.
/// Returns `None` when the source does not exist; a source that is not an
/// image file is rejected.
fn import_image(storage: &StorageLayout, source: &str) -> Result<Option<(String, String)>> {
    let source = Path::new(source);
    check_image_source(source)?;
    if !source.is_file() {
        warn!(path = %source.display(), "portfolio image not found, skipping copy");
        return Ok(None);
    }
    let name = stamped_name(&secure_basename(source));
    let dest = copy_into(source, &storage.portfolio_dir(), &name)?;
    let thumbnail = storage.thumbnails_dir().join(&name);
    Ok(Some((
        dest.to_string_lossy().into_owned(),
        thumbnail.to_string_lossy().into_owned(),
    )))
}

/// Add a piece. Status defaults to `sketch`.
pub async fn add_piece(
    pool: &SqlitePool,
    storage: &StorageLayout,
    new: NewPiece,
) -> Result<PortfolioPiece> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(StudioError::validation("piece title is required"));
    }
    if let Some(project_id) = new.project_id {
        if project_db::get_project(pool, project_id).await?.is_none() {
            return Err(StudioError::not_found("project", project_id));
        }
    }

    let (image_path, thumbnail_path) = match new.image_path.as_deref() {
        Some(source) => import_image(storage, source)?.unzip(),
        None => (None, None),
    };

    let now = Utc::now();
    let status = new.status.unwrap_or(PieceStatus::Sketch);
    let piece = PortfolioPiece {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: new.description,
        project_id: new.project_id,
        status,
        medium: new.medium,
        dimensions: new.dimensions,
        image_path,
        thumbnail_path,
        progress_images: Json(Vec::new()),
        created_at: now,
        updated_at: now,
        completed_at: (status == PieceStatus::Completed).then_some(now),
    };

    let stored = db::insert_piece(pool, &piece).await?;
    info!(piece_id = %stored.id, title = %stored.title, "added portfolio piece");
    Ok(stored)
}

pub async fn update_piece(
    pool: &SqlitePool,
    storage: &StorageLayout,
    id: Uuid,
    patch: PiecePatch,
) -> Result<PortfolioPiece> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(StudioError::validation("piece title cannot be empty"));
    }

    let mut tx = pool.begin().await?;
    if !db::lock_piece(&mut *tx, id).await? {
        return Err(StudioError::not_found("portfolio piece", id));
    }
    let mut piece = db::get_piece(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))?;
    let now = Utc::now();

    if let Some(title) = patch.title {
        piece.title = title.trim().to_string();
    }
    if let Some(status) = patch.status {
        if status == PieceStatus::Completed && piece.completed_at.is_none() {
            piece.completed_at = Some(now);
        }
        piece.status = status;
    }
    if patch.description.is_some() {
        piece.description = patch.description;
    }
    if patch.medium.is_some() {
        piece.medium = patch.medium;
    }
    if patch.dimensions.is_some() {
        piece.dimensions = patch.dimensions;
    }
    if let Some(project_id) = patch.project_id {
        if project_db::get_project(&mut *tx, project_id).await?.is_none() {
            return Err(StudioError::not_found("project", project_id));
        }
        piece.project_id = Some(project_id);
    }
    if let Some(source) = patch.image_path.as_deref() {
        if let Some((image, thumbnail)) = import_image(storage, source)? {
            piece.image_path = Some(image);
            piece.thumbnail_path = Some(thumbnail);
        }
    }
    piece.updated_at = now;

    let stored = db::update_piece(&mut *tx, &piece)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))?;
    tx.commit().await?;
    info!(piece_id = %id, status = %stored.status, "updated portfolio piece");
    Ok(stored)
}

/// Attach a progress snapshot. A piece still at `sketch` moves to `wip`.
pub async fn add_progress_image(
    pool: &SqlitePool,
    storage: &StorageLayout,
    id: Uuid,
    image_path: &str,
    description: Option<String>,
) -> Result<ProgressReport> {
    let source = Path::new(image_path);
    check_image_source(source)?;
    if !source.is_file() {
        return Err(StudioError::validation(format!(
            "image file not found: {image_path}"
        )));
    }

    let mut tx = pool.begin().await?;
    if !db::lock_piece(&mut *tx, id).await? {
        return Err(StudioError::not_found("portfolio piece", id));
    }
    let mut piece = db::get_piece(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))?;

    let name = format!("progress_{id}_{}", stamped_name(&secure_basename(source)));
    let dest = copy_into(source, &storage.progress_dir(), &name)?;

    let now = Utc::now();
    piece.progress_images.push(ProgressImage {
        path: dest.to_string_lossy().into_owned(),
        description,
        added_at: now,
    });
    if piece.status == PieceStatus::Sketch {
        piece.status = PieceStatus::Wip;
    }
    piece.updated_at = now;

    let stored = db::update_piece(&mut *tx, &piece)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))?;
    tx.commit().await?;
    Ok(ProgressReport {
        progress_count: stored.progress_images.len(),
        piece: stored,
    })
}

/// Delete a piece; with `delete_files` also remove its image, thumbnail
/// and progress files. Files are only touched once the row is gone.
pub async fn delete_piece(pool: &SqlitePool, id: Uuid, delete_files: bool) -> Result<DeleteReport> {
    let mut tx = pool.begin().await?;
    if !db::lock_piece(&mut *tx, id).await? {
        return Err(StudioError::not_found("portfolio piece", id));
    }
    let piece = db::get_piece(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("portfolio piece", id))?;
    db::delete_piece(&mut *tx, id).await?;
    tx.commit().await?;

    let mut files_removed = 0;
    if delete_files {
        let paths = piece
            .image_path
            .iter()
            .chain(piece.thumbnail_path.iter())
            .chain(piece.progress_images.iter().map(|p| &p.path));
        for path in paths {
            match std::fs::remove_file(path) {
                Ok(()) => files_removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path, error = %e, "failed to remove portfolio file"),
            }
        }
    }

    info!(piece_id = %id, files_removed, "deleted portfolio piece");

    Ok(DeleteReport {
        title: piece.title,
        files_removed,
    })
}

pub async fn portfolio_stats(pool: &SqlitePool) -> Result<PortfolioStats> {
    let pieces = db::list_all_pieces(pool).await?;
    Ok(compute_stats(&pieces))
}

fn compute_stats(pieces: &[PortfolioPiece]) -> PortfolioStats {
    let mut by_status = StatusCounts::default();
    let mut by_medium: BTreeMap<String, usize> = BTreeMap::new();
    let mut recent_completed = Vec::new();
    let mut active_wips = Vec::new();

    for piece in pieces {
        match piece.status {
            PieceStatus::Sketch => by_status.sketch += 1,
            PieceStatus::Wip => {
                by_status.wip += 1;
                active_wips.push(WipEntry {
                    id: piece.id,
                    title: piece.title.clone(),
                    updated_at: piece.updated_at,
                });
            }
            PieceStatus::Completed => {
                by_status.completed += 1;
                if let Some(completed_at) = piece.completed_at {
                    recent_completed.push(CompletedEntry {
                        id: piece.id,
                        title: piece.title.clone(),
                        completed_at,
                    });
                }
            }
        }
        let medium = piece.medium.clone().unwrap_or_else(|| "unspecified".to_string());
        *by_medium.entry(medium).or_default() += 1;
    }

    recent_completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    recent_completed.truncate(RECENT_COMPLETED);

    PortfolioStats {
        total_pieces: pieces.len(),
        by_status,
        by_medium,
        recent_completed,
        active_wips,
    }
}
