use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use studio_core::agent::{ChatService, LettaAgent};
use studio_core::inventory::{self, NewSupply, StatusSummary, SupplyPatch};
use studio_core::portfolio::{self, NewPiece, PiecePatch, PortfolioStats};
use studio_core::preferences::{self, NewPreference};
use studio_core::projects::{self, NewProject, ProjectPatch};
use studio_core::storage::StorageLayout;
use studio_core::tools::{self, ToolContext};
use studio_core::{StudioError, reconcile, suggest};
use studio_db::models::{PieceStatus, ProjectStatus};
use studio_db::pool;
use studio_db::queries::projects as project_db;

use crate::config::StudioConfig;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub storage: StorageLayout,
    pub chat: ChatService,
}

impl AppState {
    fn tools(&self) -> ToolContext {
        ToolContext {
            pool: self.pool.clone(),
            storage: self.storage.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<StudioError> for AppError {
    fn from(err: StudioError) -> Self {
        match err {
            StudioError::Validation(msg) => Self::bad_request(msg),
            err @ StudioError::NotFound { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            StudioError::Storage(err) => Self::internal(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, AppError>;

/// Serialize `value` and mark it successful. Objects gain a `success`
/// field; anything else is nested under `data`.
fn success<T: Serialize>(value: T) -> ApiResult {
    let body = serde_json::to_value(value).map_err(|e| AppError::internal(e.into()))?;
    Ok(Json(match body {
        Value::Object(mut map) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        other => json!({ "success": true, "data": other }),
    }))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChatBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct ThresholdQuery {
    threshold: Option<f64>,
}

#[derive(Deserialize)]
struct UseBody {
    amount_used: f64,
    project_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ProjectListQuery {
    status: Option<ProjectStatus>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct SuggestBody {
    #[serde(default)]
    query: String,
    budget: Option<f64>,
}

#[derive(Deserialize)]
struct NotesBody {
    notes: String,
}

#[derive(Deserialize)]
struct PortfolioQuery {
    status: Option<PieceStatus>,
    medium: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    delete_files: bool,
}

#[derive(Deserialize)]
struct ProgressBody {
    image_path: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct IdeaBody {
    idea: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SupplyCounts {
    pub total: usize,
    pub low_stock: usize,
    pub summary: StatusSummary,
}

#[derive(Debug, Serialize)]
pub struct ProjectCounts {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub supplies: SupplyCounts,
    pub projects: ProjectCounts,
    pub portfolio: PortfolioStats,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/chat/history", get(chat_history))
        .route("/api/supplies", get(list_supplies).post(add_supply))
        .route("/api/supplies/search", get(search_supplies))
        .route("/api/supplies/low-stock", get(low_stock))
        .route("/api/supplies/for-medium/{medium}", get(supplies_for_medium))
        .route("/api/supplies/scan", post(scan_supplies))
        .route("/api/supplies/{id}", get(get_supply).patch(update_supply))
        .route("/api/supplies/{id}/use", post(use_supply))
        .route("/api/supplies/{id}/usage", get(supply_usage))
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/suggest", post(suggest_project))
        .route("/api/projects/{id}", get(get_project).patch(update_project))
        .route("/api/projects/{id}/shopping-list", get(shopping_list))
        .route("/api/projects/{id}/export", post(export_project))
        .route("/api/projects/{id}/notes", post(add_notes))
        .route("/api/portfolio", get(list_portfolio).post(add_piece))
        .route("/api/portfolio/stats", get(portfolio_stats))
        .route("/api/portfolio/upload", post(upload_artwork))
        .route(
            "/api/portfolio/{id}",
            get(get_piece).patch(update_piece).delete(delete_piece),
        )
        .route("/api/portfolio/{id}/progress", post(add_progress))
        .route("/api/preferences", get(style_profile).post(save_preference))
        .route("/api/dashboard", get(dashboard))
        .route("/api/quick-action/new-project", post(quick_new_project))
        .route("/api/quick-action/check-supplies", get(quick_check_supplies))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(invoke_tool))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: &StudioConfig, bind: &str, port: u16) -> Result<()> {
    pool::ensure_database_dir(&config.db_config)?;
    let db_pool = pool::create_pool(&config.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let storage = StorageLayout::new(&config.data_dir);
    storage.ensure()?;

    let agent = LettaAgent::new(config.agent_url.clone()).context("failed to build agent client")?;
    let state = AppState {
        chat: ChatService::new(db_pool.clone(), Arc::new(agent)),
        pool: db_pool.clone(),
        storage,
    };

    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        agent_url = %config.agent_url,
        "studio serve listening on http://{addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("studio serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

async fn dashboard_summary(pool: &SqlitePool) -> Result<DashboardResponse, AppError> {
    let supplies = inventory::list_supplies(pool, None).await?;
    let total = project_db::count_projects(pool)
        .await
        .map_err(AppError::internal)?;
    let active = project_db::count_by_status(pool, ProjectStatus::InProgress)
        .await
        .map_err(AppError::internal)?;
    let portfolio = portfolio::portfolio_stats(pool).await?;

    Ok(DashboardResponse {
        supplies: SupplyCounts {
            total: supplies.total,
            low_stock: supplies.summary.low + supplies.summary.empty,
            summary: supplies.summary,
        },
        projects: ProjectCounts { total, active },
        portfolio,
    })
}

async fn index(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let summary = dashboard_summary(&state.pool).await?;
    let low = inventory::low_stock(&state.pool, None).await?;

    let rows = if low.shopping_list.is_empty() {
        "<tr><td colspan=\"2\">All supplies are well stocked.</td></tr>".to_string()
    } else {
        low.shopping_list
            .iter()
            .map(|item| {
                format!(
                    "<tr><td>{name}</td><td>{qty:.0}%</td></tr>",
                    name = escape_html(&item.name),
                    qty = item.current_quantity * 100.0,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>Art Studio Companion</title></head><body>\
<h1>Art Studio Companion</h1>\
<p>{supplies} supplies ({low_count} running low) | {projects} projects ({active} in progress) | {pieces} portfolio pieces</p>\
<p><a href=\"/api/supplies\">/api/supplies</a> | <a href=\"/api/projects\">/api/projects</a> | \
<a href=\"/api/portfolio\">/api/portfolio</a> | <a href=\"/api/tools\">/api/tools</a></p>\
<h2>Running low</h2>\
<table><tr><th>Supply</th><th>Remaining</th></tr>{rows}</table>\
</body></html>",
        supplies = summary.supplies.total,
        low_count = summary.supplies.low_stock,
        projects = summary.projects.total,
        active = summary.projects.active,
        pieces = summary.portfolio.total_pieces,
    );

    Ok(Html(html).into_response())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn dashboard(State(state): State<AppState>) -> ApiResult {
    success(dashboard_summary(&state.pool).await?)
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

async fn chat(State(state): State<AppState>, payload: Result<Json<ChatBody>, JsonRejection>) -> ApiResult {
    let Json(body) = payload?;
    success(state.chat.chat(&body.message).await?)
}

async fn chat_history(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    let messages = state.chat.history(q.limit).await?;
    success(json!({ "count": messages.len(), "messages": messages }))
}

// ---------------------------------------------------------------------------
// Supplies
// ---------------------------------------------------------------------------

async fn list_supplies(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    success(inventory::list_supplies(&state.pool, q.category.as_deref()).await?)
}

async fn add_supply(
    State(state): State<AppState>,
    payload: Result<Json<NewSupply>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let supply = inventory::add_supply(&state.pool, new).await?;
    success(json!({
        "message": format!("Added {} to inventory", supply.supply.name),
        "supply": supply,
    }))
}

async fn get_supply(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    success(json!({ "supply": inventory::get_supply(&state.pool, id).await? }))
}

async fn update_supply(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SupplyPatch>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(patch) = payload?;
    success(json!({ "supply": inventory::update_supply(&state.pool, id, patch).await? }))
}

async fn use_supply(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UseBody>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(body) = payload?;
    success(inventory::use_supply(&state.pool, id, body.amount_used, body.project_id).await?)
}

async fn supply_usage(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    success(inventory::usage_history(&state.pool, id).await?)
}

async fn search_supplies(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    let term = q.q.unwrap_or_default();
    if term.trim().is_empty() {
        return Err(AppError::bad_request("No search query provided"));
    }
    let results = inventory::search_supplies(&state.pool, &term).await?;
    success(json!({ "query": term, "count": results.len(), "results": results }))
}

async fn low_stock(
    State(state): State<AppState>,
    query: Result<Query<ThresholdQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    success(inventory::low_stock(&state.pool, q.threshold).await?)
}

async fn supplies_for_medium(State(state): State<AppState>, Path(medium): Path<String>) -> ApiResult {
    success(inventory::supplies_for_medium(&state.pool, &medium).await?)
}

/// Read the first file field called `field` from a multipart body.
async fn read_file_field(
    multipart: &mut Multipart,
    field: &str,
) -> Result<Option<(String, Bytes)>, AppError> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() == Some(field) {
            let filename = part.file_name().unwrap_or_default().to_string();
            let bytes = part.bytes().await?;
            return Ok(Some((filename, bytes)));
        }
    }
    Ok(None)
}

async fn scan_supplies(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let (filename, bytes) = read_file_field(&mut multipart, "photo")
        .await?
        .ok_or_else(|| AppError::bad_request("No photo provided"))?;
    if filename.is_empty() {
        return Err(AppError::bad_request("No file selected"));
    }
    let path = state
        .storage
        .save_upload(&state.storage.uploads_dir(), &filename, &bytes)?;
    success(json!({
        "message": "Photo uploaded successfully. Describe the supplies in it and I'll help add them to your inventory.",
        "image_path": path.to_string_lossy(),
    }))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

async fn list_projects(
    State(state): State<AppState>,
    query: Result<Query<ProjectListQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    success(projects::list_projects(&state.pool, q.status, q.limit).await?)
}

async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let project = projects::create_project(&state.pool, new).await?;
    success(json!({
        "message": format!("Created project: {}", project.title),
        "project": project,
    }))
}

async fn suggest_project(payload: Result<Json<SuggestBody>, JsonRejection>) -> ApiResult {
    let Json(body) = payload?;
    success(suggest::suggest_project(&body.query, body.budget))
}

async fn get_project(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    success(json!({ "project": projects::get_project(&state.pool, id).await? }))
}

async fn update_project(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProjectPatch>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let project = projects::update_project(&state.pool, id, patch).await?;
    success(json!({
        "message": format!("Updated project: {}", project.title),
        "project": project,
    }))
}

async fn shopping_list(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    success(reconcile::generate_shopping_list(&state.pool, id).await?)
}

async fn export_project(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let report = projects::export_project(&state.pool, &state.storage, id).await?;
    success(json!({
        "message": format!("Saved project to {}", report.file_path),
        "file_path": report.file_path,
        "project": report.project,
    }))
}

async fn add_notes(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NotesBody>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(body) = payload?;
    let project = projects::add_session_notes(&state.pool, id, &body.notes).await?;
    success(json!({ "message": "Added session notes", "project": project }))
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

async fn list_portfolio(
    State(state): State<AppState>,
    query: Result<Query<PortfolioQuery>, QueryRejection>,
) -> ApiResult {
    let Query(q) = query?;
    success(portfolio::list_portfolio(&state.pool, q.status, q.medium.as_deref(), q.limit).await?)
}

async fn add_piece(
    State(state): State<AppState>,
    payload: Result<Json<NewPiece>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let piece = portfolio::add_piece(&state.pool, &state.storage, new).await?;
    success(json!({
        "message": format!("Added '{}' to portfolio", piece.title),
        "piece": piece,
    }))
}

async fn portfolio_stats(State(state): State<AppState>) -> ApiResult {
    success(json!({ "stats": portfolio::portfolio_stats(&state.pool).await? }))
}

async fn upload_artwork(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let (filename, bytes) = read_file_field(&mut multipart, "image")
        .await?
        .ok_or_else(|| AppError::bad_request("No image provided"))?;
    if filename.is_empty() {
        return Err(AppError::bad_request("No file selected"));
    }
    let path = state
        .storage
        .save_upload(&state.storage.portfolio_dir(), &filename, &bytes)?;
    success(json!({ "image_path": path.to_string_lossy() }))
}

async fn get_piece(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    success(json!({ "piece": portfolio::get_piece(&state.pool, id).await? }))
}

async fn update_piece(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PiecePatch>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let piece = portfolio::update_piece(&state.pool, &state.storage, id, patch).await?;
    success(json!({
        "message": format!("Updated '{}'", piece.title),
        "piece": piece,
    }))
}

async fn delete_piece(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Query(q) = query?;
    let report = portfolio::delete_piece(&state.pool, id, q.delete_files).await?;
    success(json!({
        "message": format!("Deleted '{}' from portfolio", report.title),
        "files_removed": report.files_removed,
    }))
}

async fn add_progress(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProgressBody>, JsonRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(body) = payload?;
    let report = portfolio::add_progress_image(
        &state.pool,
        &state.storage,
        id,
        &body.image_path,
        body.description,
    )
    .await?;
    success(json!({
        "message": "Added progress image",
        "piece": report.piece,
        "progress_count": report.progress_count,
    }))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

async fn style_profile(State(state): State<AppState>) -> ApiResult {
    success(preferences::style_profile(&state.pool).await?)
}

async fn save_preference(
    State(state): State<AppState>,
    payload: Result<Json<NewPreference>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    success(preferences::save_style_preference(&state.pool, new).await?)
}

// ---------------------------------------------------------------------------
// Quick actions
// ---------------------------------------------------------------------------

async fn quick_new_project(payload: Result<Json<IdeaBody>, JsonRejection>) -> ApiResult {
    let Json(body) = payload?;
    let idea = body
        .idea
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| "new art project".to_string());
    let suggestion = suggest::suggest_project(&idea, None);
    success(json!({
        "action": "new_project",
        "suggestion": suggestion.suggested_project,
        "message": format!("Here's a project plan for: {idea}"),
    }))
}

async fn quick_check_supplies(State(state): State<AppState>) -> ApiResult {
    let report = inventory::low_stock(&state.pool, None).await?;
    let message = if report.total_low_stock > 0 {
        format!("You have {} items running low.", report.total_low_stock)
    } else {
        "All supplies are well stocked!".to_string()
    };
    success(json!({
        "action": "check_supplies",
        "low_stock": report.supplies,
        "shopping_list": report.shopping_list,
        "message": message,
    }))
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

async fn list_tools() -> ApiResult {
    let catalog = tools::catalog();
    success(json!({ "count": catalog.len(), "tools": catalog }))
}

async fn invoke_tool(State(state): State<AppState>, Path(name): Path<String>, body: Bytes) -> ApiResult {
    let args = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("invalid JSON arguments: {e}")))?
    };
    let result = tools::invoke(&state.tools(), &name, args).await?;
    success(json!({ "tool": name, "result": result }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::SqlitePool;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use studio_core::agent::{AgentError, ChatAgent, ChatReply, ChatService};
    use studio_core::storage::StorageLayout;
    use studio_test_utils::{create_test_db, drop_test_db};

    use super::AppState;

    struct CannedAgent;

    #[async_trait]
    impl ChatAgent for CannedAgent {
        fn name(&self) -> &str {
            "canned"
        }

        async fn send_message(&self, _text: &str) -> Result<ChatReply, AgentError> {
            Ok(ChatReply {
                response: "Try a limited palette.".to_string(),
                tool_calls: Vec::new(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn app(pool: &SqlitePool, dir: &TempDir) -> axum::Router {
        super::build_router(AppState {
            pool: pool.clone(),
            storage: StorageLayout::new(dir.path().join("data")),
            chat: ChatService::new(pool.clone(), Arc::new(CannedAgent)),
        })
    }

    async fn send(app: axum::Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_html() {
        let (pool, dir) = create_test_db().await;

        let resp = send(app(&pool, &dir), "GET", "/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap();
        assert!(
            content_type.contains("text/html"),
            "content-type should contain text/html, got: {content_type}"
        );

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/chat",
            Some(serde_json::json!({"message": ""})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_chat_round_trip_and_history() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/chat",
            Some(serde_json::json!({"message": "ideas for tonight?"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["response"], "Try a limited palette.");
        assert_eq!(json["fallback"], false);

        let resp = send(app(&pool, &dir), "GET", "/api/chat/history", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["messages"][0]["role"], "user");

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_supply_lifecycle() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/supplies",
            Some(serde_json::json!({"name": "Cobalt Blue", "category": "paint", "quantity": 0.6})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["supply"]["status"], "plenty");
        let id = json["supply"]["id"].as_str().unwrap().to_string();

        let resp = send(
            app(&pool, &dir),
            "POST",
            &format!("/api/supplies/{id}/use"),
            Some(serde_json::json!({"amount_used": 0.5})),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["status_alert"], "Cobalt Blue is now running low!");

        let resp = send(app(&pool, &dir), "GET", &format!("/api/supplies/{id}/usage"), None).await;
        let json = body_json(resp).await;
        assert_eq!(json["usage"].as_array().unwrap().len(), 1);
        assert_eq!(json["total_used"], 0.5);

        let resp = send(app(&pool, &dir), "GET", "/api/supplies/low-stock", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["total_low_stock"], 1);

        let resp = send(app(&pool, &dir), "GET", "/api/supplies/search?q=cobalt", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["count"], 1);

        let resp = send(app(&pool, &dir), "GET", "/api/supplies", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["summary"]["empty"], 1);

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_missing_supply_is_404_and_bad_id_is_400() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "GET",
            &format!("/api/supplies/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["success"], false);

        let resp = send(app(&pool, &dir), "GET", "/api/supplies/not-a-uuid", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_project_shopping_list_and_export() {
        let (pool, dir) = create_test_db().await;

        send(
            app(&pool, &dir),
            "POST",
            "/api/supplies",
            Some(serde_json::json!({"name": "Cadmium Yellow", "quantity": 0.05})),
        )
        .await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/projects",
            Some(serde_json::json!({
                "title": "Sunflowers",
                "materials_list": ["Cadmium Yellow", {"name": "Rigger brush", "category": "brush"}]
            })),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["project"]["status"], "planned");
        let id = json["project"]["id"].as_str().unwrap().to_string();

        let resp = send(
            app(&pool, &dir),
            "GET",
            &format!("/api/projects/{id}/shopping-list"),
            None,
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["items_to_buy"], 2);
        assert_eq!(json["shopping_list"][0]["reason"], "low stock");
        assert_eq!(json["shopping_list"][1]["reason"], "not in inventory");

        let resp = send(
            app(&pool, &dir),
            "POST",
            &format!("/api/projects/{id}/export"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let path = json["file_path"].as_str().unwrap();
        assert!(std::path::Path::new(path).is_file());

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_suggest_and_quick_actions() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/projects/suggest",
            Some(serde_json::json!({"query": "watercolor botanical", "budget": 25})),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["suggested_project"]["title"], "Botanical in Watercolor");
        assert_eq!(json["parsed_from_query"]["budget_constraint"], 25.0);

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/quick-action/new-project",
            Some(serde_json::json!({})),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["action"], "new_project");
        assert_eq!(json["suggestion"]["title"], "New Art Project");

        let resp = send(app(&pool, &dir), "GET", "/api/quick-action/check-supplies", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["message"], "All supplies are well stocked!");

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_scan_upload_stores_photo() {
        let (pool, dir) = create_test_db().await;

        let boundary = "studio-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"my shelf.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n\
             fakejpeg\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/supplies/scan")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let resp = app(&pool, &dir).oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let path = json["image_path"].as_str().unwrap();
        assert!(path.ends_with("my_shelf.jpg"));
        assert_eq!(std::fs::read(path).unwrap(), b"fakejpeg");

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_portfolio_and_dashboard() {
        let (pool, dir) = create_test_db().await;

        let resp = send(
            app(&pool, &dir),
            "POST",
            "/api/portfolio",
            Some(serde_json::json!({"title": "Morning fog", "status": "wip"})),
        )
        .await;
        let json = body_json(resp).await;
        let id = json["piece"]["id"].as_str().unwrap().to_string();

        let resp = send(app(&pool, &dir), "GET", "/api/dashboard", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["portfolio"]["total_pieces"], 1);
        assert_eq!(json["portfolio"]["active_wips"][0]["title"], "Morning fog");

        let resp = send(
            app(&pool, &dir),
            "DELETE",
            &format!("/api/portfolio/{id}?delete_files=true"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(app(&pool, &dir), "GET", &format!("/api/portfolio/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_preferences_endpoints() {
        let (pool, dir) = create_test_db().await;

        for _ in 0..2 {
            send(
                app(&pool, &dir),
                "POST",
                "/api/preferences",
                Some(serde_json::json!({"category": "palette", "value": "muted earth tones"})),
            )
            .await;
        }

        let resp = send(app(&pool, &dir), "GET", "/api/preferences", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["total_preferences"], 1);
        let confidence = json["preferences"]["palette"][0]["confidence"].as_f64().unwrap();
        assert!((confidence - 0.6).abs() < 1e-9);

        drop_test_db(pool, dir).await;
    }

    #[tokio::test]
    async fn test_tools_catalog_and_unknown_tool() {
        let (pool, dir) = create_test_db().await;

        let resp = send(app(&pool, &dir), "GET", "/api/tools", None).await;
        let json = body_json(resp).await;
        assert!(json["count"].as_u64().unwrap() > 20);

        let resp = send(app(&pool, &dir), "POST", "/api/tools/get_portfolio_stats", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["result"]["total_pieces"], 0);

        let resp = send(app(&pool, &dir), "POST", "/api/tools/nope", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        drop_test_db(pool, dir).await;
    }
}
