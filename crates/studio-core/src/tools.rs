//! Named-tool dispatch over the store operations.
//!
//! Every operation the assistant may call is listed in [`catalog`] and run
//! through [`invoke`] with JSON arguments, returning JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use studio_db::models::{PieceStatus, ProjectStatus};

use crate::error::{Result, StudioError};
use crate::inventory::{self, NewSupply, SupplyPatch};
use crate::portfolio::{self, NewPiece, PiecePatch};
use crate::preferences::{self, NewPreference};
use crate::projects::{self, NewProject, ProjectPatch};
use crate::reconcile;
use crate::storage::StorageLayout;
use crate::suggest;

/// Handles a tool needs to run.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub pool: SqlitePool,
    pub storage: StorageLayout,
}

/// One entry of the tool catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub group: &'static str,
    pub description: &'static str,
}

const fn tool(name: &'static str, group: &'static str, description: &'static str) -> ToolSpec {
    ToolSpec {
        name,
        group,
        description,
    }
}

const CATALOG: &[ToolSpec] = &[
    tool("get_all_supplies", "inventory", "List supplies grouped by status; optional `category`."),
    tool("get_supply_by_id", "inventory", "Fetch one supply by `supply_id`."),
    tool("add_supply", "inventory", "Add a supply; `name` required, quantity 0..1 defaults to 1."),
    tool("update_supply", "inventory", "Patch fields of supply `supply_id`."),
    tool("get_low_stock_supplies", "inventory", "Supplies at or below `threshold` (default 0.25)."),
    tool("use_supply", "inventory", "Record `amount_used` of supply `supply_id`, optionally for `project_id`."),
    tool("get_supply_usage", "inventory", "Usage history of supply `supply_id`, newest first."),
    tool("search_supplies", "inventory", "Search supplies by name, brand, category or color with `query`."),
    tool("get_supplies_for_project", "inventory", "Check which essentials for `medium` are in stock."),
    tool("get_all_projects", "projects", "List projects; optional `status` and `limit`."),
    tool("get_project", "projects", "Fetch one project by `project_id`."),
    tool("create_project", "projects", "Create a planned project; `title` required."),
    tool("update_project", "projects", "Patch fields of project `project_id`."),
    tool("save_project_to_file", "projects", "Export project `project_id` to a JSON file."),
    tool("generate_shopping_list", "projects", "Compare the materials of `project_id` with the inventory."),
    tool("create_project_from_query", "projects", "Suggest a project outline from free-text `query` and optional `budget`."),
    tool("add_session_notes", "projects", "Append timestamped `notes` to project `project_id`."),
    tool("get_portfolio", "portfolio", "List portfolio pieces; optional `status`, `medium`, `limit`."),
    tool("get_portfolio_piece", "portfolio", "Fetch one piece by `piece_id`."),
    tool("add_portfolio_piece", "portfolio", "Add a piece; `title` required, `image_path` is copied in."),
    tool("update_portfolio_piece", "portfolio", "Patch fields of piece `piece_id`."),
    tool("add_progress_image", "portfolio", "Attach progress image `image_path` to piece `piece_id`."),
    tool("delete_portfolio_piece", "portfolio", "Delete piece `piece_id`; `delete_files` also removes images."),
    tool("get_portfolio_stats", "portfolio", "Totals by status and medium, recent completions, active WIPs."),
    tool("analyze_style_preferences", "preferences", "Return the style profile grouped by category."),
    tool("save_style_preference", "preferences", "Record `category`/`value`; repeats raise confidence."),
];

/// Every callable tool.
pub fn catalog() -> &'static [ToolSpec] {
    CATALOG
}

#[derive(Deserialize)]
struct CategoryArgs {
    category: Option<String>,
}

#[derive(Deserialize)]
struct SupplyIdArgs {
    supply_id: Uuid,
}

#[derive(Deserialize)]
struct UpdateSupplyArgs {
    supply_id: Uuid,
    #[serde(flatten)]
    patch: SupplyPatch,
}

#[derive(Deserialize)]
struct ThresholdArgs {
    threshold: Option<f64>,
}

#[derive(Deserialize)]
struct UseSupplyArgs {
    supply_id: Uuid,
    amount_used: f64,
    project_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

#[derive(Deserialize)]
struct MediumArgs {
    medium: String,
}

#[derive(Deserialize)]
struct ListProjectsArgs {
    status: Option<ProjectStatus>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct ProjectIdArgs {
    project_id: Uuid,
}

#[derive(Deserialize)]
struct UpdateProjectArgs {
    project_id: Uuid,
    #[serde(flatten)]
    patch: ProjectPatch,
}

#[derive(Deserialize)]
struct SuggestArgs {
    query: String,
    budget: Option<f64>,
}

#[derive(Deserialize)]
struct NotesArgs {
    project_id: Uuid,
    notes: String,
}

#[derive(Deserialize)]
struct ListPortfolioArgs {
    status: Option<PieceStatus>,
    medium: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct PieceIdArgs {
    piece_id: Uuid,
}

#[derive(Deserialize)]
struct UpdatePieceArgs {
    piece_id: Uuid,
    #[serde(flatten)]
    patch: PiecePatch,
}

#[derive(Deserialize)]
struct ProgressArgs {
    piece_id: Uuid,
    image_path: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct DeletePieceArgs {
    piece_id: Uuid,
    #[serde(default)]
    delete_files: bool,
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| StudioError::validation(format!("invalid arguments for {tool}: {e}")))
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| StudioError::Storage(e.into()))
}

/// Run tool `name` with JSON `args`.
pub async fn invoke(ctx: &ToolContext, name: &str, args: Value) -> Result<Value> {
    debug!(tool = name, "invoking tool");
    let pool = &ctx.pool;
    let storage = &ctx.storage;

    match name {
        "get_all_supplies" => {
            let a: CategoryArgs = parse(name, args)?;
            to_json(inventory::list_supplies(pool, a.category.as_deref()).await?)
        }
        "get_supply_by_id" => {
            let a: SupplyIdArgs = parse(name, args)?;
            to_json(inventory::get_supply(pool, a.supply_id).await?)
        }
        "add_supply" => {
            let a: NewSupply = parse(name, args)?;
            to_json(inventory::add_supply(pool, a).await?)
        }
        "update_supply" => {
            let a: UpdateSupplyArgs = parse(name, args)?;
            to_json(inventory::update_supply(pool, a.supply_id, a.patch).await?)
        }
        "get_low_stock_supplies" => {
            let a: ThresholdArgs = parse(name, args)?;
            to_json(inventory::low_stock(pool, a.threshold).await?)
        }
        "use_supply" => {
            let a: UseSupplyArgs = parse(name, args)?;
            to_json(inventory::use_supply(pool, a.supply_id, a.amount_used, a.project_id).await?)
        }
        "get_supply_usage" => {
            let a: SupplyIdArgs = parse(name, args)?;
            to_json(inventory::usage_history(pool, a.supply_id).await?)
        }
        "search_supplies" => {
            let a: QueryArgs = parse(name, args)?;
            to_json(inventory::search_supplies(pool, &a.query).await?)
        }
        "get_supplies_for_project" => {
            let a: MediumArgs = parse(name, args)?;
            to_json(inventory::supplies_for_medium(pool, &a.medium).await?)
        }
        "get_all_projects" => {
            let a: ListProjectsArgs = parse(name, args)?;
            to_json(projects::list_projects(pool, a.status, a.limit).await?)
        }
        "get_project" => {
            let a: ProjectIdArgs = parse(name, args)?;
            to_json(projects::get_project(pool, a.project_id).await?)
        }
        "create_project" => {
            let a: NewProject = parse(name, args)?;
            to_json(projects::create_project(pool, a).await?)
        }
        "update_project" => {
            let a: UpdateProjectArgs = parse(name, args)?;
            to_json(projects::update_project(pool, a.project_id, a.patch).await?)
        }
        "save_project_to_file" => {
            let a: ProjectIdArgs = parse(name, args)?;
            to_json(projects::export_project(pool, storage, a.project_id).await?)
        }
        "generate_shopping_list" => {
            let a: ProjectIdArgs = parse(name, args)?;
            to_json(reconcile::generate_shopping_list(pool, a.project_id).await?)
        }
        "create_project_from_query" => {
            let a: SuggestArgs = parse(name, args)?;
            to_json(suggest::suggest_project(&a.query, a.budget))
        }
        "add_session_notes" => {
            let a: NotesArgs = parse(name, args)?;
            to_json(projects::add_session_notes(pool, a.project_id, &a.notes).await?)
        }
        "get_portfolio" => {
            let a: ListPortfolioArgs = parse(name, args)?;
            to_json(portfolio::list_portfolio(pool, a.status, a.medium.as_deref(), a.limit).await?)
        }
        "get_portfolio_piece" => {
            let a: PieceIdArgs = parse(name, args)?;
            to_json(portfolio::get_piece(pool, a.piece_id).await?)
        }
        "add_portfolio_piece" => {
            let a: NewPiece = parse(name, args)?;
            to_json(portfolio::add_piece(pool, storage, a).await?)
        }
        "update_portfolio_piece" => {
            let a: UpdatePieceArgs = parse(name, args)?;
            to_json(portfolio::update_piece(pool, storage, a.piece_id, a.patch).await?)
        }
        "add_progress_image" => {
            let a: ProgressArgs = parse(name, args)?;
            to_json(
                portfolio::add_progress_image(pool, storage, a.piece_id, &a.image_path, a.description)
                    .await?,
            )
        }
        "delete_portfolio_piece" => {
            let a: DeletePieceArgs = parse(name, args)?;
            to_json(portfolio::delete_piece(pool, a.piece_id, a.delete_files).await?)
        }
        "get_portfolio_stats" => to_json(portfolio::portfolio_stats(pool).await?),
        "analyze_style_preferences" => to_json(preferences::style_profile(pool).await?),
        "save_style_preference" => {
            let a: NewPreference = parse(name, args)?;
            to_json(preferences::save_style_preference(pool, a).await?)
        }
        other => Err(StudioError::validation(format!("unknown tool: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        let names: HashSet<_> = catalog().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn parse_treats_null_as_empty_object() {
        let a: ThresholdArgs = parse("get_low_stock_supplies", Value::Null).unwrap();
        assert_eq!(a.threshold, None);
    }

    #[test]
    fn parse_reports_bad_arguments_as_validation() {
        let err = parse::<SupplyIdArgs>("get_supply_by_id", serde_json::json!({"supply_id": 7}))
            .err()
            .unwrap();
        assert!(matches!(err, StudioError::Validation(ref m) if m.contains("get_supply_by_id")));
    }

    #[test]
    fn flattened_patch_picks_up_fields() {
        let a: UpdateSupplyArgs = parse(
            "update_supply",
            serde_json::json!({"supply_id": Uuid::nil(), "quantity": 0.3, "notes": "half tube"}),
        )
        .unwrap();
        assert_eq!(a.patch.quantity, Some(0.3));
        assert_eq!(a.patch.notes.as_deref(), Some("half tube"));
    }
}
