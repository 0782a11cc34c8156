//! Integration tests for the per-table query functions.

use chrono::{Duration, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use studio_db::models::{
    ChatRole, Material, PieceStatus, PortfolioPiece, Project, ProjectStatus, Step, StylePreference,
    Supply, SupplyUsage,
};
use studio_db::queries::{chat_history, portfolio, preferences, projects, supplies};
use studio_test_utils::{create_test_db, drop_test_db};

fn supply(name: &str, brand: Option<&str>, category: &str, quantity: f64) -> Supply {
    let now = Utc::now();
    Supply {
        id: Uuid::new_v4(),
        name: name.to_string(),
        brand: brand.map(str::to_string),
        category: Some(category.to_string()),
        color: None,
        size: None,
        quantity,
        unit: Some("tube".to_string()),
        notes: None,
        image_path: None,
        created_at: now,
        updated_at: now,
    }
}

fn project(title: &str) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        status: ProjectStatus::Planned,
        medium: Some("watercolor".to_string()),
        style: None,
        estimated_budget: Some(40.0),
        actual_budget: None,
        materials_list: Json(vec![Material::new("Cadmium Yellow", Some("paint"))]),
        steps: Json(vec![Step {
            step: 1,
            description: "Sketch".to_string(),
        }]),
        notes: None,
        file_path: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

// -----------------------------------------------------------------------
// Supplies
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_get_and_update_supply() {
    let (db, dir) = create_test_db().await;

    let inserted = supplies::insert_supply(&db, &supply("Cadmium Yellow", Some("Winsor & Newton"), "paint", 0.8))
        .await
        .expect("insert should succeed");
    assert_eq!(inserted.name, "Cadmium Yellow");
    assert_eq!(inserted.quantity, 0.8);

    let mut fetched = supplies::get_supply(&db, inserted.id)
        .await
        .unwrap()
        .expect("supply should exist");
    assert_eq!(fetched.brand.as_deref(), Some("Winsor & Newton"));

    fetched.quantity = 0.3;
    fetched.notes = Some("half used".to_string());
    let updated = supplies::update_supply(&db, &fetched)
        .await
        .unwrap()
        .expect("row should be updated");
    assert_eq!(updated.quantity, 0.3);
    assert_eq!(updated.notes.as_deref(), Some("half used"));

    let missing = supplies::update_supply(&db, &supply("ghost", None, "paint", 0.5))
        .await
        .unwrap();
    assert!(missing.is_none());

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn list_supplies_filters_by_category() {
    let (db, dir) = create_test_db().await;

    supplies::insert_supply(&db, &supply("Round Brush", None, "brush", 1.0)).await.unwrap();
    supplies::insert_supply(&db, &supply("Ultramarine", None, "paint", 1.0)).await.unwrap();
    supplies::insert_supply(&db, &supply("Alizarin", None, "paint", 1.0)).await.unwrap();

    let all = supplies::list_supplies(&db, None).await.unwrap();
    let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Round Brush", "Alizarin", "Ultramarine"]);

    let paints = supplies::list_supplies(&db, Some("paint")).await.unwrap();
    assert_eq!(paints.len(), 2);
    assert!(paints.iter().all(|s| s.category.as_deref() == Some("paint")));

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn low_stock_includes_threshold_boundary() {
    let (db, dir) = create_test_db().await;

    supplies::insert_supply(&db, &supply("At boundary", None, "paint", 0.25)).await.unwrap();
    supplies::insert_supply(&db, &supply("Empty", None, "paint", 0.0)).await.unwrap();
    supplies::insert_supply(&db, &supply("Fine", None, "paint", 0.26)).await.unwrap();

    let low = supplies::list_low_stock(&db, 0.25).await.unwrap();
    let names: Vec<&str> = low.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Empty", "At boundary"]);

    let available = supplies::list_available(&db, 0.1).await.unwrap();
    assert_eq!(available.len(), 2);

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn search_is_case_insensitive_across_columns() {
    let (db, dir) = create_test_db().await;

    let mut blue = supply("Ultramarine", Some("Daniel Smith"), "paint", 1.0);
    blue.color = Some("Blue".to_string());
    supplies::insert_supply(&db, &blue).await.unwrap();
    supplies::insert_supply(&db, &supply("Sable Round", Some("Princeton"), "brush", 1.0))
        .await
        .unwrap();

    assert_eq!(supplies::search_supplies(&db, "blue").await.unwrap().len(), 1);
    assert_eq!(supplies::search_supplies(&db, "PRINCETON").await.unwrap().len(), 1);
    assert_eq!(supplies::search_supplies(&db, "a").await.unwrap().len(), 2);
    assert!(supplies::search_supplies(&db, "100%").await.unwrap().is_empty());

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn creation_order_is_stable() {
    let (db, dir) = create_test_db().await;

    let base = Utc::now();
    for (i, name) in ["first", "second", "third"].iter().enumerate() {
        let mut s = supply(name, None, "paint", 1.0);
        s.created_at = base + Duration::seconds(i as i64);
        supplies::insert_supply(&db, &s).await.unwrap();
    }

    let ordered = supplies::list_supplies_in_creation_order(&db).await.unwrap();
    let names: Vec<&str> = ordered.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn usage_rows_are_recorded() {
    let (db, dir) = create_test_db().await;

    let s = supplies::insert_supply(&db, &supply("Gesso", None, "medium", 1.0)).await.unwrap();
    let usage = SupplyUsage {
        id: Uuid::new_v4(),
        supply_id: s.id,
        project_id: None,
        quantity_used: 0.2,
        used_at: Utc::now(),
    };
    supplies::insert_usage(&db, &usage).await.unwrap();

    let history = supplies::list_usage_for_supply(&db, s.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].quantity_used, 0.2);

    drop_test_db(db, dir).await;
}

// -----------------------------------------------------------------------
// Projects
// -----------------------------------------------------------------------

#[tokio::test]
async fn project_json_columns_roundtrip() {
    let (db, dir) = create_test_db().await;

    let inserted = projects::insert_project(&db, &project("Sunflowers")).await.unwrap();
    let fetched = projects::get_project(&db, inserted.id).await.unwrap().unwrap();

    assert_eq!(fetched.status, ProjectStatus::Planned);
    assert_eq!(fetched.materials_list.0, vec![Material::new("Cadmium Yellow", Some("paint"))]);
    assert_eq!(fetched.steps.0.len(), 1);
    assert_eq!(fetched.estimated_budget, Some(40.0));

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn list_projects_filters_and_limits() {
    let (db, dir) = create_test_db().await;

    let base = Utc::now();
    for i in 0..3 {
        let mut p = project(&format!("Study {i}"));
        p.updated_at = base + Duration::seconds(i);
        if i == 2 {
            p.status = ProjectStatus::InProgress;
        }
        projects::insert_project(&db, &p).await.unwrap();
    }

    let all = projects::list_projects(&db, None, 50).await.unwrap();
    assert_eq!(all[0].title, "Study 2", "newest update first");

    let limited = projects::list_projects(&db, None, 2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let active = projects::list_projects(&db, Some(ProjectStatus::InProgress), 50)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(
        projects::count_by_status(&db, ProjectStatus::Planned).await.unwrap(),
        2
    );
    assert_eq!(projects::count_projects(&db).await.unwrap(), 3);

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn set_file_path_on_missing_project_fails() {
    let (db, dir) = create_test_db().await;

    let err = projects::set_file_path(&db, Uuid::new_v4(), "/tmp/x.json")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    drop_test_db(db, dir).await;
}

// -----------------------------------------------------------------------
// Portfolio
// -----------------------------------------------------------------------

#[tokio::test]
async fn portfolio_insert_list_delete() {
    let (db, dir) = create_test_db().await;

    let now = Utc::now();
    let piece = PortfolioPiece {
        id: Uuid::new_v4(),
        title: "Harbor at dusk".to_string(),
        description: None,
        project_id: None,
        status: PieceStatus::Sketch,
        medium: Some("ink".to_string()),
        dimensions: None,
        image_path: None,
        thumbnail_path: None,
        progress_images: Json(Vec::new()),
        created_at: now,
        updated_at: now,
        completed_at: None,
    };
    let inserted = portfolio::insert_piece(&db, &piece).await.unwrap();

    let sketches = portfolio::list_pieces(&db, Some(PieceStatus::Sketch), None, 50)
        .await
        .unwrap();
    assert_eq!(sketches.len(), 1);
    let oils = portfolio::list_pieces(&db, None, Some("oil"), 50).await.unwrap();
    assert!(oils.is_empty());

    let mut tx = db.begin().await.unwrap();
    assert!(portfolio::lock_piece(&mut *tx, piece.id).await.unwrap());
    assert!(!portfolio::lock_piece(&mut *tx, Uuid::new_v4()).await.unwrap());
    tx.commit().await.unwrap();
    let unchanged = portfolio::get_piece(&db, piece.id).await.unwrap().unwrap();
    assert_eq!(unchanged.updated_at, inserted.updated_at);

    assert!(portfolio::delete_piece(&db, piece.id).await.unwrap());
    assert!(!portfolio::delete_piece(&db, piece.id).await.unwrap());
    assert!(portfolio::get_piece(&db, piece.id).await.unwrap().is_none());

    drop_test_db(db, dir).await;
}

// -----------------------------------------------------------------------
// Preferences and chat
// -----------------------------------------------------------------------

#[tokio::test]
async fn preferences_are_unique_per_category_value() {
    let (db, dir) = create_test_db().await;

    let now = Utc::now();
    let pref = StylePreference {
        id: Uuid::new_v4(),
        category: "mood".to_string(),
        value: "serene".to_string(),
        confidence: 0.5,
        source: "chat".to_string(),
        created_at: now,
        updated_at: now,
    };
    preferences::insert_preference(&db, &pref).await.unwrap();

    let duplicate = StylePreference {
        id: Uuid::new_v4(),
        ..pref.clone()
    };
    assert!(preferences::insert_preference(&db, &duplicate).await.is_err());

    let found = preferences::find_preference(&db, "mood", "serene")
        .await
        .unwrap()
        .expect("should find preference");
    let bumped = preferences::set_confidence(&db, found.id, 0.6, Utc::now())
        .await
        .unwrap();
    assert!((bumped.confidence - 0.6).abs() < 1e-9);

    drop_test_db(db, dir).await;
}

#[tokio::test]
async fn chat_history_returns_oldest_first() {
    let (db, dir) = create_test_db().await;

    chat_history::insert_message(&db, ChatRole::User, "hello").await.unwrap();
    chat_history::insert_message(&db, ChatRole::Assistant, "hi there").await.unwrap();
    chat_history::insert_message(&db, ChatRole::User, "what paints do I have?").await.unwrap();

    let recent = chat_history::recent_messages(&db, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].content, "hi there");
    assert_eq!(recent[1].role, ChatRole::User);

    drop_test_db(db, dir).await;
}
