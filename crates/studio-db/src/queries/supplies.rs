//! Database query functions for the `supplies` and `supply_usage` tables.

use anyhow::{Context, Result};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{Supply, SupplyUsage};

/// Insert a fully-formed supply row and return it as stored.
pub async fn insert_supply<'e>(db: impl SqliteExecutor<'e>, supply: &Supply) -> Result<Supply> {
    let row = sqlx::query_as::<_, Supply>(
        "INSERT INTO supplies \
         (id, name, brand, category, color, size, quantity, unit, notes, image_path, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
         RETURNING *",
    )
    .bind(supply.id)
    .bind(&supply.name)
    .bind(&supply.brand)
    .bind(&supply.category)
    .bind(&supply.color)
    .bind(&supply.size)
    .bind(supply.quantity)
    .bind(&supply.unit)
    .bind(&supply.notes)
    .bind(&supply.image_path)
    .bind(supply.created_at)
    .bind(supply.updated_at)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert supply {:?}", supply.name))?;

    Ok(row)
}

/// Fetch a supply by its ID.
pub async fn get_supply<'e>(db: impl SqliteExecutor<'e>, id: Uuid) -> Result<Option<Supply>> {
    let supply = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch supply")?;

    Ok(supply)
}

/// List supplies ordered by category then name, optionally filtered by
/// exact category.
pub async fn list_supplies<'e>(
    db: impl SqliteExecutor<'e>,
    category: Option<&str>,
) -> Result<Vec<Supply>> {
    let supplies = sqlx::query_as::<_, Supply>(
        "SELECT * FROM supplies \
         WHERE (?1 IS NULL OR category = ?1) \
         ORDER BY category, name",
    )
    .bind(category)
    .fetch_all(db)
    .await
    .context("failed to list supplies")?;

    Ok(supplies)
}

/// List every supply in insertion order.
///
/// The reconciler depends on a stable iteration order: the first matching
/// record wins.
pub async fn list_supplies_in_creation_order<'e>(db: impl SqliteExecutor<'e>) -> Result<Vec<Supply>> {
    let supplies =
        sqlx::query_as::<_, Supply>("SELECT * FROM supplies ORDER BY created_at ASC, rowid ASC")
            .fetch_all(db)
            .await
            .context("failed to list supplies in creation order")?;

    Ok(supplies)
}

/// List supplies whose quantity is at or below `threshold`, emptiest first.
pub async fn list_low_stock<'e>(db: impl SqliteExecutor<'e>, threshold: f64) -> Result<Vec<Supply>> {
    let supplies = sqlx::query_as::<_, Supply>(
        "SELECT * FROM supplies WHERE quantity <= ?1 ORDER BY quantity ASC, category ASC",
    )
    .bind(threshold)
    .fetch_all(db)
    .await
    .context("failed to list low-stock supplies")?;

    Ok(supplies)
}

/// List supplies with strictly more than `min_quantity` remaining.
pub async fn list_available<'e>(db: impl SqliteExecutor<'e>, min_quantity: f64) -> Result<Vec<Supply>> {
    let supplies = sqlx::query_as::<_, Supply>(
        "SELECT * FROM supplies WHERE quantity > ?1 ORDER BY category, name",
    )
    .bind(min_quantity)
    .fetch_all(db)
    .await
    .context("failed to list available supplies")?;

    Ok(supplies)
}

/// Case-insensitive substring search across name, brand, category and color.
pub async fn search_supplies<'e>(db: impl SqliteExecutor<'e>, query: &str) -> Result<Vec<Supply>> {
    let pattern = format!("%{}%", escape_like(query));
    let supplies = sqlx::query_as::<_, Supply>(
        "SELECT * FROM supplies \
         WHERE name LIKE ?1 ESCAPE '\\' \
            OR brand LIKE ?1 ESCAPE '\\' \
            OR category LIKE ?1 ESCAPE '\\' \
            OR color LIKE ?1 ESCAPE '\\' \
         ORDER BY category, name",
    )
    .bind(pattern)
    .fetch_all(db)
    .await
    .context("failed to search supplies")?;

    Ok(supplies)
}

/// Overwrite every mutable column of a supply. Returns the stored row, or
/// `None` when the supply does not exist.
pub async fn update_supply<'e>(db: impl SqliteExecutor<'e>, supply: &Supply) -> Result<Option<Supply>> {
    let row = sqlx::query_as::<_, Supply>(
        "UPDATE supplies SET \
           name = ?2, brand = ?3, category = ?4, color = ?5, size = ?6, \
           quantity = ?7, unit = ?8, notes = ?9, image_path = ?10, updated_at = ?11 \
         WHERE id = ?1 \
         RETURNING *",
    )
    .bind(supply.id)
    .bind(&supply.name)
    .bind(&supply.brand)
    .bind(&supply.category)
    .bind(&supply.color)
    .bind(&supply.size)
    .bind(supply.quantity)
    .bind(&supply.unit)
    .bind(&supply.notes)
    .bind(&supply.image_path)
    .bind(supply.updated_at)
    .fetch_optional(db)
    .await
    .with_context(|| format!("failed to update supply {}", supply.id))?;

    Ok(row)
}

/// Record a usage event for a supply.
pub async fn insert_usage<'e>(db: impl SqliteExecutor<'e>, usage: &SupplyUsage) -> Result<SupplyUsage> {
    let row = sqlx::query_as::<_, SupplyUsage>(
        "INSERT INTO supply_usage (id, supply_id, project_id, quantity_used, used_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         RETURNING *",
    )
    .bind(usage.id)
    .bind(usage.supply_id)
    .bind(usage.project_id)
    .bind(usage.quantity_used)
    .bind(usage.used_at)
    .fetch_one(db)
    .await
    .context("failed to insert supply usage")?;

    Ok(row)
}

/// Usage history for a supply, most recent first.
pub async fn list_usage_for_supply<'e>(
    db: impl SqliteExecutor<'e>,
    supply_id: Uuid,
) -> Result<Vec<SupplyUsage>> {
    let rows = sqlx::query_as::<_, SupplyUsage>(
        "SELECT * FROM supply_usage WHERE supply_id = ?1 ORDER BY used_at DESC, rowid DESC",
    )
    .bind(supply_id)
    .fetch_all(db)
    .await
    .context("failed to list supply usage")?;

    Ok(rows)
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("cadmium"), "cadmium");
    }
}
