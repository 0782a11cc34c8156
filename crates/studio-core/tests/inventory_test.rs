//! Integration tests for inventory operations and the shopping-list
//! reconciler against a real SQLite file.

use studio_core::StudioError;
use studio_core::inventory::{self, NewSupply, SupplyPatch, SupplyStatus, Urgency};
use studio_core::projects::{self, NewProject};
use studio_core::reconcile::{self, BuyReason};
use studio_db::models::Material;
use studio_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn add_supply_applies_defaults_and_clamps() {
    let (pool, dir) = create_test_db().await;

    let full = inventory::add_supply(&pool, NewSupply::new("Gesso", "primer"))
        .await
        .unwrap();
    assert_eq!(full.supply.quantity, 1.0);
    assert_eq!(full.supply.unit.as_deref(), Some("piece"));
    assert_eq!(full.status, SupplyStatus::Plenty);

    let over = inventory::add_supply(&pool, NewSupply::new("Ink", "ink").quantity(3.0))
        .await
        .unwrap();
    assert_eq!(over.supply.quantity, 1.0);

    let err = inventory::add_supply(&pool, NewSupply::new("  ", "paint"))
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Validation(_)));

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn update_supply_clamps_quantity_and_keeps_other_fields() {
    let (pool, dir) = create_test_db().await;

    let added = inventory::add_supply(
        &pool,
        NewSupply::new("Cadmium Red", "paint").brand("Winsor").color("red"),
    )
    .await
    .unwrap();

    let updated = inventory::update_supply(
        &pool,
        added.supply.id,
        SupplyPatch {
            quantity: Some(-0.5),
            ..SupplyPatch::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.supply.quantity, 0.0);
    assert_eq!(updated.supply.brand.as_deref(), Some("Winsor"));
    assert_eq!(updated.status, SupplyStatus::Critical);

    let missing = inventory::update_supply(&pool, uuid::Uuid::new_v4(), SupplyPatch::default())
        .await
        .unwrap_err();
    assert!(missing.is_not_found());

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn use_supply_never_goes_negative_and_records_usage() {
    let (pool, dir) = create_test_db().await;

    let added = inventory::add_supply(&pool, NewSupply::new("Titanium White", "paint").quantity(0.3))
        .await
        .unwrap();
    let id = added.supply.id;

    let first = inventory::use_supply(&pool, id, 0.1, None).await.unwrap();
    assert_eq!(first.previous_quantity, 0.3);
    assert!((first.supply.supply.quantity - 0.2).abs() < 1e-9);
    assert_eq!(
        first.status_alert.as_deref(),
        Some("Titanium White is now running low!")
    );

    let second = inventory::use_supply(&pool, id, 5.0, None).await.unwrap();
    assert_eq!(second.supply.supply.quantity, 0.0);
    assert_eq!(
        second.status_alert.as_deref(),
        Some("Titanium White is almost empty!")
    );

    let history = inventory::usage_history(&pool, id).await.unwrap();
    assert_eq!(history.usage.len(), 2);
    assert_eq!(history.usage[0].quantity_used, 5.0);
    assert!((history.total_used - 5.1).abs() < 1e-9);

    let err = inventory::use_supply(&pool, id, -0.1, None).await.unwrap_err();
    assert!(matches!(err, StudioError::Validation(_)));
    assert_eq!(inventory::usage_history(&pool, id).await.unwrap().usage.len(), 2);
    let err = inventory::usage_history(&pool, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn use_supply_for_unknown_project_is_rejected() {
    let (pool, dir) = create_test_db().await;

    let added = inventory::add_supply(&pool, NewSupply::new("Charcoal", "drawing"))
        .await
        .unwrap();
    let err = inventory::use_supply(&pool, added.supply.id, 0.1, Some(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Rolled back: quantity untouched.
    let after = inventory::get_supply(&pool, added.supply.id).await.unwrap();
    assert_eq!(after.supply.quantity, 1.0);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn list_supplies_groups_by_status() {
    let (pool, dir) = create_test_db().await;

    for (name, q) in [("A", 0.9), ("B", 0.5), ("C", 0.3), ("D", 0.1)] {
        inventory::add_supply(&pool, NewSupply::new(name, "paint").quantity(q))
            .await
            .unwrap();
    }

    let overview = inventory::list_supplies(&pool, None).await.unwrap();
    assert_eq!(overview.total, 4);
    assert_eq!(overview.summary.plenty, 2);
    assert_eq!(overview.summary.low, 1);
    assert_eq!(overview.summary.empty, 1);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn low_stock_is_inclusive_and_grouped() {
    let (pool, dir) = create_test_db().await;

    inventory::add_supply(&pool, NewSupply::new("Round #2", "brush").quantity(0.25))
        .await
        .unwrap();
    inventory::add_supply(&pool, NewSupply::new("Sepia", "paint").quantity(0.05))
        .await
        .unwrap();
    inventory::add_supply(
        &pool,
        NewSupply {
            name: "Mystery".to_string(),
            quantity: Some(0.2),
            ..NewSupply::default()
        },
    )
    .await
    .unwrap();
    inventory::add_supply(&pool, NewSupply::new("Plenty", "paint").quantity(0.26))
        .await
        .unwrap();

    let report = inventory::low_stock(&pool, None).await.unwrap();
    assert_eq!(report.total_low_stock, 3);
    assert_eq!(report.supplies[0].supply.name, "Sepia");
    assert_eq!(report.shopping_list[0].urgency, Urgency::Critical);
    assert_eq!(report.shopping_list[1].urgency, Urgency::Low);
    assert!(report.by_category.contains_key("uncategorized"));
    assert_eq!(report.by_category["brush"].len(), 1);

    let tighter = inventory::low_stock(&pool, Some(0.1)).await.unwrap();
    assert_eq!(tighter.total_low_stock, 1);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn supplies_for_watercolor_reports_missing_essentials() {
    let (pool, dir) = create_test_db().await;

    for (name, category, color) in [
        ("Hansa", "paint", "Yellow"),
        ("Pyrrol", "paint", "Red"),
        ("Ultramarine", "paint", "Blue"),
        ("Kolinsky Round 8", "brush", ""),
    ] {
        inventory::add_supply(&pool, NewSupply::new(name, category).color(color))
            .await
            .unwrap();
    }
    // Too little left to count.
    inventory::add_supply(
        &pool,
        NewSupply::new("Cold press watercolor paper", "paper").quantity(0.05),
    )
    .await
    .unwrap();

    let readiness = inventory::supplies_for_medium(&pool, "watercolor").await.unwrap();
    assert!(!readiness.ready_to_start);
    assert_eq!(readiness.missing_essentials.len(), 1);
    assert_eq!(readiness.missing_essentials[0].item, "watercolor paper");
    assert_eq!(readiness.available_supplies.len(), 4);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let (pool, dir) = create_test_db().await;

    inventory::add_supply(&pool, NewSupply::new("Burnt Sienna", "paint").brand("Daniel Smith"))
        .await
        .unwrap();
    inventory::add_supply(&pool, NewSupply::new("Fan brush", "brush"))
        .await
        .unwrap();

    let hits = inventory::search_supplies(&pool, "daniel").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].supply.name, "Burnt Sienna");

    let hits = inventory::search_supplies(&pool, "BRUSH").await.unwrap();
    assert_eq!(hits.len(), 1);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn shopping_list_for_stored_project() {
    let (pool, dir) = create_test_db().await;

    inventory::add_supply(&pool, NewSupply::new("Cadmium Yellow", "paint").quantity(0.05))
        .await
        .unwrap();
    inventory::add_supply(&pool, NewSupply::new("Watercolor paper", "paper"))
        .await
        .unwrap();

    let project = projects::create_project(
        &pool,
        NewProject {
            title: "Sunflowers".to_string(),
            estimated_budget: Some(35.0),
            materials_list: vec![
                Material::new("Cadmium Yellow", Some("paint")),
                Material::new("Watercolor paper", Some("paper")),
                Material::new("Masking fluid", None),
            ],
            ..NewProject::default()
        },
    )
    .await
    .unwrap();

    let list = reconcile::generate_shopping_list(&pool, project.id).await.unwrap();
    assert_eq!(list.project, "Sunflowers");
    assert_eq!(list.items_to_buy, 2);
    assert_eq!(list.items_available, 1);
    assert_eq!(list.estimated_budget, Some(35.0));
    assert_eq!(list.shopping_list[0].item, "Cadmium Yellow");
    assert_eq!(list.shopping_list[0].reason, BuyReason::LowStock);
    assert_eq!(list.shopping_list[0].current_quantity, 0.05);
    assert_eq!(list.shopping_list[1].reason, BuyReason::NotInInventory);
    assert_eq!(list.shopping_list[1].current_quantity, 0.0);

    drop_test_db(pool, dir).await;
}

#[tokio::test]
async fn shopping_list_without_materials_has_message() {
    let (pool, dir) = create_test_db().await;

    let project = projects::create_project(
        &pool,
        NewProject {
            title: "Blank".to_string(),
            ..NewProject::default()
        },
    )
    .await
    .unwrap();

    let list = reconcile::generate_shopping_list(&pool, project.id).await.unwrap();
    assert!(list.shopping_list.is_empty());
    assert!(list.already_have.is_empty());
    assert_eq!(
        list.message.as_deref(),
        Some("No materials list defined for this project")
    );

    let err = reconcile::generate_shopping_list(&pool, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    drop_test_db(pool, dir).await;
}
