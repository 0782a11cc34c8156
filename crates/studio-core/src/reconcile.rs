//! Shopping-list reconciliation: compare a project's materials against the
//! inventory and decide what still has to be bought.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use studio_db::models::{Material, Supply};
use studio_db::queries::{projects as project_db, supplies as supply_db};

use crate::error::{Result, StudioError};

/// Stock strictly below this is bought again.
pub const SUFFICIENT_QUANTITY: f64 = 0.25;

/// Why an item is on the shopping list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuyReason {
    #[serde(rename = "low stock")]
    LowStock,
    #[serde(rename = "not in inventory")]
    NotInInventory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToBuy {
    pub item: String,
    pub reason: BuyReason,
    pub current_quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnHand {
    pub item: String,
    pub quantity: f64,
    pub brand: Option<String>,
}

/// Output of [`reconcile`]; both lists follow the materials order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub shopping_list: Vec<ToBuy>,
    pub already_have: Vec<OnHand>,
}

/// Shopping list for a stored project.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub project: String,
    pub shopping_list: Vec<ToBuy>,
    pub already_have: Vec<OnHand>,
    pub items_to_buy: usize,
    pub items_available: usize,
    pub estimated_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn match_key(supply: &Supply) -> String {
    match &supply.brand {
        Some(brand) if !brand.is_empty() => format!("{}_{}", supply.name, brand).to_lowercase(),
        _ => supply.name.to_lowercase(),
    }
}

/// Reconcile `materials` against `inventory`.
///
/// `inventory` must be in creation order: the first record whose key
/// contains the material name (or is contained by it) is the match. Of two
/// records with the same name and brand, the older one is used.
pub fn reconcile(materials: &[Material], inventory: &[Supply]) -> Reconciliation {
    let keyed: Vec<(String, &Supply)> = inventory.iter().map(|s| (match_key(s), s)).collect();
    let mut out = Reconciliation::default();

    for material in materials {
        let wanted = material.name.to_lowercase();
        let found = keyed
            .iter()
            .find(|(key, _)| key.contains(&wanted) || wanted.contains(key.as_str()))
            .map(|(_, supply)| *supply);

        match found {
            Some(supply) if supply.quantity < SUFFICIENT_QUANTITY => out.shopping_list.push(ToBuy {
                item: material.name.clone(),
                reason: BuyReason::LowStock,
                current_quantity: supply.quantity,
                brand: supply.brand.clone(),
            }),
            Some(supply) => out.already_have.push(OnHand {
                item: material.name.clone(),
                quantity: supply.quantity,
                brand: supply.brand.clone(),
            }),
            None => out.shopping_list.push(ToBuy {
                item: material.name.clone(),
                reason: BuyReason::NotInInventory,
                current_quantity: 0.0,
                brand: None,
            }),
        }
    }

    out
}

/// Build the shopping list for project `id` from the current inventory.
pub async fn generate_shopping_list(pool: &SqlitePool, id: Uuid) -> Result<ShoppingList> {
    let project = project_db::get_project(pool, id)
        .await?
        .ok_or_else(|| StudioError::not_found("project", id))?;

    if project.materials_list.is_empty() {
        return Ok(ShoppingList {
            project: project.title,
            shopping_list: Vec::new(),
            already_have: Vec::new(),
            items_to_buy: 0,
            items_available: 0,
            estimated_budget: project.estimated_budget,
            message: Some("No materials list defined for this project".to_string()),
        });
    }

    let inventory = supply_db::list_supplies_in_creation_order(pool).await?;
    let Reconciliation {
        shopping_list,
        already_have,
    } = reconcile(&project.materials_list, &inventory);

    debug!(
        project_id = %id,
        to_buy = shopping_list.len(),
        on_hand = already_have.len(),
        "reconciled materials"
    );

    Ok(ShoppingList {
        project: project.title,
        items_to_buy: shopping_list.len(),
        items_available: already_have.len(),
        shopping_list,
        already_have,
        estimated_budget: project.estimated_budget,
        message: None,
    })
}
