//! Database query functions for the `portfolio_pieces` table.

use anyhow::{Context, Result};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{PieceStatus, PortfolioPiece};

/// Insert a fully-formed portfolio piece and return it as stored.
pub async fn insert_piece<'e>(
    db: impl SqliteExecutor<'e>,
    piece: &PortfolioPiece,
) -> Result<PortfolioPiece> {
    let row = sqlx::query_as::<_, PortfolioPiece>(
        "INSERT INTO portfolio_pieces \
         (id, title, description, project_id, status, medium, dimensions, image_path, \
          thumbnail_path, progress_images, created_at, updated_at, completed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
         RETURNING *",
    )
    .bind(piece.id)
    .bind(&piece.title)
    .bind(&piece.description)
    .bind(piece.project_id)
    .bind(piece.status)
    .bind(&piece.medium)
    .bind(&piece.dimensions)
    .bind(&piece.image_path)
    .bind(&piece.thumbnail_path)
    .bind(&piece.progress_images)
    .bind(piece.created_at)
    .bind(piece.updated_at)
    .bind(piece.completed_at)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert portfolio piece {:?}", piece.title))?;

    Ok(row)
}

/// Fetch a portfolio piece by its ID.
pub async fn get_piece<'e>(db: impl SqliteExecutor<'e>, id: Uuid) -> Result<Option<PortfolioPiece>> {
    let piece = sqlx::query_as::<_, PortfolioPiece>("SELECT * FROM portfolio_pieces WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch portfolio piece")?;

    Ok(piece)
}

/// List pieces, most recently updated first, with optional exact filters.
pub async fn list_pieces<'e>(
    db: impl SqliteExecutor<'e>,
    status: Option<PieceStatus>,
    medium: Option<&str>,
    limit: i64,
) -> Result<Vec<PortfolioPiece>> {
    let pieces = sqlx::query_as::<_, PortfolioPiece>(
        "SELECT * FROM portfolio_pieces \
         WHERE (?1 IS NULL OR status = ?1) \
           AND (?2 IS NULL OR medium = ?2) \
         ORDER BY updated_at DESC, rowid DESC \
         LIMIT ?3",
    )
    .bind(status)
    .bind(medium)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to list portfolio pieces")?;

    Ok(pieces)
}

/// List every piece, unfiltered and unbounded.
pub async fn list_all_pieces<'e>(db: impl SqliteExecutor<'e>) -> Result<Vec<PortfolioPiece>> {
    let pieces = sqlx::query_as::<_, PortfolioPiece>(
        "SELECT * FROM portfolio_pieces ORDER BY created_at ASC, rowid ASC",
    )
    .fetch_all(db)
    .await
    .context("failed to list all portfolio pieces")?;

    Ok(pieces)
}

/// Overwrite every mutable column of a piece. Returns the stored row, or
/// `None` when the piece does not exist.
pub async fn update_piece<'e>(
    db: impl SqliteExecutor<'e>,
    piece: &PortfolioPiece,
) -> Result<Option<PortfolioPiece>> {
    let row = sqlx::query_as::<_, PortfolioPiece>(
        "UPDATE portfolio_pieces SET \
           title = ?2, description = ?3, project_id = ?4, status = ?5, medium = ?6, \
           dimensions = ?7, image_path = ?8, thumbnail_path = ?9, progress_images = ?10, \
           updated_at = ?11, completed_at = ?12 \
         WHERE id = ?1 \
         RETURNING *",
    )
    .bind(piece.id)
    .bind(&piece.title)
    .bind(&piece.description)
    .bind(piece.project_id)
    .bind(piece.status)
    .bind(&piece.medium)
    .bind(&piece.dimensions)
    .bind(&piece.image_path)
    .bind(&piece.thumbnail_path)
    .bind(&piece.progress_images)
    .bind(piece.updated_at)
    .bind(piece.completed_at)
    .fetch_optional(db)
    .await
    .with_context(|| format!("failed to update portfolio piece {}", piece.id))?;

    Ok(row)
}

/// Delete a piece. Returns `true` when a row was removed.
pub async fn delete_piece<'e>(db: impl SqliteExecutor<'e>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM portfolio_pieces WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete portfolio piece")?;

    Ok(result.rows_affected() > 0)
}

/// Take the database write lock inside a transaction before reading a piece
/// back for modification. Returns `false` when the piece does not exist.
pub async fn lock_piece<'e>(db: impl SqliteExecutor<'e>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE portfolio_pieces SET updated_at = updated_at WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await
        .with_context(|| format!("failed to lock portfolio piece {id}"))?;

    Ok(result.rows_affected() > 0)
}
