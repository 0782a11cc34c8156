//! Supply inventory: status derivation, CRUD, usage tracking and the
//! per-medium readiness check.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use studio_db::models::{Supply, SupplyUsage};
use studio_db::queries::{projects as project_db, supplies as db};

use crate::error::{Result, StudioError};

/// Quantity at or above which a supply is considered plentiful.
pub const PLENTY_THRESHOLD: f64 = 0.5;
/// Quantity at or above which a supply is low rather than critical.
pub const LOW_THRESHOLD: f64 = 0.25;
/// Default cut-off for the low-stock report (inclusive).
pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 0.25;
/// Below this a low-stock item is urgent.
pub const CRITICAL_URGENCY: f64 = 0.1;
/// Supplies at or below this are not counted as usable for a new project.
pub const USABLE_MIN_QUANTITY: f64 = 0.1;

/// Derived three-level classification of a supply's remaining quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyStatus {
    Plenty,
    Low,
    Critical,
}

impl SupplyStatus {
    /// Display color used by the dashboard.
    pub fn color(self) -> &'static str {
        match self {
            Self::Plenty => "green",
            Self::Low => "yellow",
            Self::Critical => "red",
        }
    }
}

/// Map a quantity onto its status.
pub fn status_for(quantity: f64) -> SupplyStatus {
    if quantity >= PLENTY_THRESHOLD {
        SupplyStatus::Plenty
    } else if quantity >= LOW_THRESHOLD {
        SupplyStatus::Low
    } else {
        SupplyStatus::Critical
    }
}

/// Clamp a quantity into `[0, 1]`. NaN becomes 0.
pub fn clamp_quantity(quantity: f64) -> f64 {
    if quantity.is_nan() {
        0.0
    } else {
        quantity.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Fields for a new supply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSupply {
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
}

impl NewSupply {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// A partial update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplyPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
}

/// A supply together with its derived status.
#[derive(Debug, Clone, Serialize)]
pub struct SupplyView {
    #[serde(flatten)]
    pub supply: Supply,
    pub status: SupplyStatus,
}

impl From<Supply> for SupplyView {
    fn from(supply: Supply) -> Self {
        let status = status_for(supply.quantity);
        Self { supply, status }
    }
}

/// Counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub plenty: usize,
    pub low: usize,
    pub empty: usize,
}

/// Full inventory listing grouped by status.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryOverview {
    pub total: usize,
    pub supplies: Vec<SupplyView>,
    pub by_status: BTreeMap<SupplyStatus, Vec<SupplyView>>,
    pub summary: StatusSummary,
}

/// One entry of the low-stock shopping list.
#[derive(Debug, Clone, Serialize)]
pub struct RestockItem {
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub current_quantity: f64,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    Low,
}

/// Supplies at or below a threshold.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockReport {
    pub threshold: f64,
    pub total_low_stock: usize,
    pub supplies: Vec<SupplyView>,
    pub by_category: BTreeMap<String, Vec<SupplyView>>,
    pub shopping_list: Vec<RestockItem>,
}

/// Result of recording supply usage.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub supply: SupplyView,
    pub usage_recorded: f64,
    pub previous_quantity: f64,
    pub status_alert: Option<String>,
}

/// Recorded consumption of one supply, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct UsageHistory {
    pub supply: SupplyView,
    pub total_used: f64,
    pub usage: Vec<SupplyUsage>,
}

/// An essential item a medium needs but the inventory lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEssential {
    pub category: String,
    pub item: String,
}

/// Whether the inventory covers a medium's essentials.
#[derive(Debug, Clone, Serialize)]
pub struct MediumReadiness {
    pub medium: String,
    pub available_supplies: Vec<SupplyView>,
    pub missing_essentials: Vec<MissingEssential>,
    pub ready_to_start: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// List supplies (optionally one category) grouped by status.
pub async fn list_supplies(pool: &SqlitePool, category: Option<&str>) -> Result<InventoryOverview> {
    let supplies = db::list_supplies(pool, category).await?;
    Ok(overview(supplies))
}

fn overview(supplies: Vec<Supply>) -> InventoryOverview {
    let views: Vec<SupplyView> = supplies.into_iter().map(SupplyView::from).collect();

    let mut by_status: BTreeMap<SupplyStatus, Vec<SupplyView>> = [
        (SupplyStatus::Plenty, Vec::new()),
        (SupplyStatus::Low, Vec::new()),
        (SupplyStatus::Critical, Vec::new()),
    ]
    .into_iter()
    .collect();
    for view in &views {
        by_status.entry(view.status).or_default().push(view.clone());
    }

    let summary = StatusSummary {
        plenty: by_status[&SupplyStatus::Plenty].len(),
        low: by_status[&SupplyStatus::Low].len(),
        empty: by_status[&SupplyStatus::Critical].len(),
    };

    InventoryOverview {
        total: views.len(),
        supplies: views,
        by_status,
        summary,
    }
}

/// Fetch one supply.
pub async fn get_supply(pool: &SqlitePool, id: Uuid) -> Result<SupplyView> {
    let supply = db::get_supply(pool, id)
        .await?
        .ok_or_else(|| StudioError::not_found("supply", id))?;
    Ok(supply.into())
}

/// Add a supply. Quantity defaults to full and is clamped to `[0, 1]`;
/// unit defaults to `piece`.
pub async fn add_supply(pool: &SqlitePool, new: NewSupply) -> Result<SupplyView> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(StudioError::validation("supply name is required"));
    }

    let now = Utc::now();
    let supply = Supply {
        id: Uuid::new_v4(),
        name: name.to_string(),
        brand: new.brand,
        category: new.category,
        color: new.color,
        size: new.size,
        quantity: clamp_quantity(new.quantity.unwrap_or(1.0)),
        unit: Some(new.unit.unwrap_or_else(|| "piece".to_string())),
        notes: new.notes,
        image_path: new.image_path,
        created_at: now,
        updated_at: now,
    };

    let stored = db::insert_supply(pool, &supply).await?;
    info!(supply_id = %stored.id, name = %stored.name, "added supply");
    Ok(stored.into())
}

/// Patch a supply. A provided quantity is clamped to `[0, 1]`.
pub async fn update_supply(pool: &SqlitePool, id: Uuid, patch: SupplyPatch) -> Result<SupplyView> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(StudioError::validation("supply name cannot be empty"));
    }

    let mut tx = pool.begin().await?;
    let mut supply = db::get_supply(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("supply", id))?;

    if let Some(name) = patch.name {
        supply.name = name.trim().to_string();
    }
    if let Some(quantity) = patch.quantity {
        supply.quantity = clamp_quantity(quantity);
    }
    if patch.brand.is_some() {
        supply.brand = patch.brand;
    }
    if patch.category.is_some() {
        supply.category = patch.category;
    }
    if patch.color.is_some() {
        supply.color = patch.color;
    }
    if patch.size.is_some() {
        supply.size = patch.size;
    }
    if patch.unit.is_some() {
        supply.unit = patch.unit;
    }
    if patch.notes.is_some() {
        supply.notes = patch.notes;
    }
    if patch.image_path.is_some() {
        supply.image_path = patch.image_path;
    }
    supply.updated_at = Utc::now();

    let stored = db::update_supply(&mut *tx, &supply)
        .await?
        .ok_or_else(|| StudioError::not_found("supply", id))?;
    tx.commit().await?;

    debug!(supply_id = %id, quantity = stored.quantity, "updated supply");
    Ok(stored.into())
}

/// Supplies at or below `threshold`, grouped by category, with a restock list.
pub async fn low_stock(pool: &SqlitePool, threshold: Option<f64>) -> Result<LowStockReport> {
    let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold.is_nan() {
        return Err(StudioError::validation("threshold must be a number"));
    }

    let supplies = db::list_low_stock(pool, threshold).await?;

    let shopping_list = supplies
        .iter()
        .map(|s| RestockItem {
            name: s.name.clone(),
            brand: s.brand.clone(),
            category: s.category.clone(),
            current_quantity: s.quantity,
            urgency: if s.quantity < CRITICAL_URGENCY {
                Urgency::Critical
            } else {
                Urgency::Low
            },
        })
        .collect();

    let views: Vec<SupplyView> = supplies.into_iter().map(SupplyView::from).collect();
    let mut by_category: BTreeMap<String, Vec<SupplyView>> = BTreeMap::new();
    for view in &views {
        let key = view
            .supply
            .category
            .clone()
            .unwrap_or_else(|| "uncategorized".to_string());
        by_category.entry(key).or_default().push(view.clone());
    }

    Ok(LowStockReport {
        threshold,
        total_low_stock: views.len(),
        supplies: views,
        by_category,
        shopping_list,
    })
}

/// Record that `amount` of a supply was used, optionally for a project.
///
/// The quantity never drops below zero. The usage row and the new quantity
/// are written in one transaction.
pub async fn use_supply(
    pool: &SqlitePool,
    id: Uuid,
    amount: f64,
    project_id: Option<Uuid>,
) -> Result<UsageReport> {
    if amount.is_nan() || amount < 0.0 {
        return Err(StudioError::validation(
            "amount used must be a non-negative number",
        ));
    }

    let mut tx = pool.begin().await?;
    let mut supply = db::get_supply(&mut *tx, id)
        .await?
        .ok_or_else(|| StudioError::not_found("supply", id))?;

    if let Some(project_id) = project_id {
        if project_db::get_project(&mut *tx, project_id).await?.is_none() {
            return Err(StudioError::not_found("project", project_id));
        }
    }

    let previous = supply.quantity;
    supply.quantity = clamp_quantity(previous - amount);
    supply.updated_at = Utc::now();

    let stored = db::update_supply(&mut *tx, &supply)
        .await?
        .ok_or_else(|| StudioError::not_found("supply", id))?;
    db::insert_usage(
        &mut *tx,
        &SupplyUsage {
            id: Uuid::new_v4(),
            supply_id: id,
            project_id,
            quantity_used: amount,
            used_at: supply.updated_at,
        },
    )
    .await?;
    tx.commit().await?;

    let status_alert = usage_alert(&stored.name, previous, stored.quantity);
    info!(
        supply_id = %id,
        previous,
        remaining = stored.quantity,
        "recorded supply usage"
    );

    Ok(UsageReport {
        supply: stored.into(),
        usage_recorded: amount,
        previous_quantity: previous,
        status_alert,
    })
}

fn usage_alert(name: &str, previous: f64, current: f64) -> Option<String> {
    if current < LOW_THRESHOLD && previous >= LOW_THRESHOLD {
        Some(format!("{name} is now running low!"))
    } else if current < CRITICAL_URGENCY {
        Some(format!("{name} is almost empty!"))
    } else {
        None
    }
}

pub async fn usage_history(pool: &SqlitePool, id: Uuid) -> Result<UsageHistory> {
    let supply = get_supply(pool, id).await?;
    let usage = db::list_usage_for_supply(pool, id).await?;
    Ok(UsageHistory {
        supply,
        total_used: usage.iter().map(|u| u.quantity_used).sum(),
        usage,
    })
}

/// Case-insensitive search by name, brand, category or color.
pub async fn search_supplies(pool: &SqlitePool, query: &str) -> Result<Vec<SupplyView>> {
    let supplies = db::search_supplies(pool, query.trim()).await?;
    Ok(supplies.into_iter().map(SupplyView::from).collect())
}

/// Essential items per medium, as `(category, items)`.
fn essentials_for(medium: &str) -> &'static [(&'static str, &'static [&'static str])] {
    match medium {
        "watercolor" => &[
            ("paint", &["yellow", "red", "blue"]),
            ("brush", &["round"]),
            ("paper", &["watercolor paper"]),
        ],
        "oil" => &[
            ("paint", &["white", "yellow", "red", "blue"]),
            ("brush", &["flat", "filbert"]),
            ("canvas", &["canvas"]),
            ("medium", &["linseed oil", "turpentine"]),
        ],
        "acrylic" => &[
            ("paint", &["white", "yellow", "red", "blue"]),
            ("brush", &["flat", "round"]),
            ("canvas", &["canvas"]),
        ],
        _ => &[],
    }
}

/// Check which of a medium's essentials are stocked.
///
/// An essential counts as present when it appears in the lowercase
/// `name + " " + color` of a usable supply in the essential's category.
/// Unknown mediums have no essentials and are always ready.
pub async fn supplies_for_medium(pool: &SqlitePool, medium: &str) -> Result<MediumReadiness> {
    let supplies = db::list_available(pool, USABLE_MIN_QUANTITY).await?;
    let missing_essentials = missing_essentials(&medium.to_lowercase(), &supplies);

    Ok(MediumReadiness {
        medium: medium.to_string(),
        ready_to_start: missing_essentials.is_empty(),
        available_supplies: supplies.into_iter().map(SupplyView::from).collect(),
        missing_essentials,
    })
}

fn missing_essentials(medium: &str, supplies: &[Supply]) -> Vec<MissingEssential> {
    let mut missing = Vec::new();
    for (category, items) in essentials_for(medium) {
        let haystacks: Vec<String> = supplies
            .iter()
            .filter(|s| s.category.as_deref() == Some(*category))
            .map(|s| format!("{} {}", s.name, s.color.as_deref().unwrap_or_default()).to_lowercase())
            .collect();
        for item in *items {
            if !haystacks.iter().any(|h| h.contains(item)) {
                missing.push(MissingEssential {
                    category: (*category).to_string(),
                    item: (*item).to_string(),
                });
            }
        }
    }
    missing
}
