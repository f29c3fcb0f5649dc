use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ChartWindow, Developer, PlanningSnapshot, ScaleTick, SchedulableItem, SchedulerConfig,
    TimeScale, TimelineReport, ValidationError, compute_timelines, validate_snapshot,
};

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<PlanningSnapshot>>,
    config: Arc<SchedulerConfig>,
}

impl AppState {
    pub fn new(snapshot: PlanningSnapshot, config: SchedulerConfig) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            config: Arc::new(config),
        }
    }

    pub fn with_shared(snapshot: Arc<RwLock<PlanningSnapshot>>, config: SchedulerConfig) -> Self {
        Self {
            snapshot,
            config: Arc::new(config),
        }
    }

    fn snapshot(&self) -> Arc<RwLock<PlanningSnapshot>> {
        self.snapshot.clone()
    }

    /// Compute against a copy so writers are not blocked by the calculation.
    async fn compute(&self) -> Result<TimelineReport, ApiError> {
        let snapshot = self.snapshot.read().clone();
        compute_off_runtime(snapshot, self.config.clone()).await
    }
}

/// The relaxation is CPU-bound and fans out to rayon, so it runs on the
/// blocking pool instead of an async worker.
async fn compute_off_runtime(
    snapshot: PlanningSnapshot,
    config: Arc<SchedulerConfig>,
) -> Result<TimelineReport, ApiError> {
    tokio::task::spawn_blocking(move || compute_timelines(&snapshot, &config))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "timeline computation failed");
            ApiError::internal(format!("timeline computation failed: {err}"))
        })
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/developers", get(list_developers).post(create_developer))
        .route(
            "/developers/:id",
            get(get_developer)
                .put(update_developer)
                .delete(delete_developer),
        )
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/timelines", get(get_timelines).post(compute_posted_timelines))
        .route("/chart", get(get_chart))
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    snapshot: PlanningSnapshot,
    config: SchedulerConfig,
) -> std::io::Result<()> {
    let state = AppState::new(snapshot, config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "timeline api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_developers(State(state): State<AppState>) -> Json<Vec<Developer>> {
    let snapshot = state.snapshot();
    let developers = snapshot.read().developers.clone();
    Json(developers)
}

async fn get_developer(
    State(state): State<AppState>,
    Path(developer_id): Path<String>,
) -> Result<Json<Developer>, ApiError> {
    let snapshot = state.snapshot();
    let found = snapshot.read().developer(&developer_id).cloned();
    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("developer {developer_id} not found")))
}

async fn create_developer(
    State(state): State<AppState>,
    Json(developer): Json<Developer>,
) -> Result<(StatusCode, Json<Developer>), ApiError> {
    if developer.id.trim().is_empty() {
        return Err(ApiError::invalid("developer id must not be empty"));
    }
    let snapshot = state.snapshot();
    let mut guard = snapshot.write();
    if guard.developer(&developer.id).is_some() {
        return Err(ApiError::Conflict(format!(
            "developer {} already exists",
            developer.id
        )));
    }
    guard.upsert_developer(developer.clone());
    Ok((StatusCode::CREATED, Json(developer)))
}

async fn update_developer(
    State(state): State<AppState>,
    Path(developer_id): Path<String>,
    Json(developer): Json<Developer>,
) -> Result<Json<Developer>, ApiError> {
    if developer.id != developer_id {
        return Err(ApiError::invalid(
            "developer id in payload does not match path parameter",
        ));
    }
    let snapshot = state.snapshot();
    let mut guard = snapshot.write();
    if guard.developer(&developer_id).is_none() {
        return Err(ApiError::not_found(format!(
            "developer {developer_id} not found"
        )));
    }
    guard.upsert_developer(developer.clone());
    Ok(Json(developer))
}

async fn delete_developer(
    State(state): State<AppState>,
    Path(developer_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let snapshot = state.snapshot();
    let removed = snapshot.write().remove_developer(&developer_id);
    if !removed {
        return Err(ApiError::not_found(format!(
            "developer {developer_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<SchedulableItem>> {
    let snapshot = state.snapshot();
    let items = snapshot.read().items.clone();
    Json(items)
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<SchedulableItem>, ApiError> {
    let snapshot = state.snapshot();
    let found = snapshot.read().item(&item_id).cloned();
    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("item {item_id} not found")))
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<SchedulableItem>,
) -> Result<(StatusCode, Json<SchedulableItem>), ApiError> {
    if item.id.trim().is_empty() {
        return Err(ApiError::invalid("item id must not be empty"));
    }
    let snapshot = state.snapshot();
    let mut guard = snapshot.write();
    if guard.item(&item.id).is_some() {
        return Err(ApiError::Conflict(format!("item {} already exists", item.id)));
    }
    guard.upsert_item(item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(item): Json<SchedulableItem>,
) -> Result<Json<SchedulableItem>, ApiError> {
    if item.id != item_id {
        return Err(ApiError::invalid(
            "item id in payload does not match path parameter",
        ));
    }
    let snapshot = state.snapshot();
    let mut guard = snapshot.write();
    if guard.item(&item_id).is_none() {
        return Err(ApiError::not_found(format!("item {item_id} not found")));
    }
    guard.upsert_item(item.clone());
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let snapshot = state.snapshot();
    let removed = snapshot.write().remove_item(&item_id);
    if !removed {
        return Err(ApiError::not_found(format!("item {item_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_timelines(
    State(state): State<AppState>,
) -> Result<Json<TimelineReport>, ApiError> {
    state.compute().await.map(Json)
}

async fn compute_posted_timelines(
    State(state): State<AppState>,
    Json(snapshot): Json<PlanningSnapshot>,
) -> Result<Json<TimelineReport>, ApiError> {
    validate_snapshot(&snapshot)?;
    compute_off_runtime(snapshot, state.config.clone())
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
struct ChartQuery {
    #[serde(default)]
    scale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartBar {
    pub item_id: String,
    pub left: f64,
    pub width: f64,
    pub conflict: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartResponse {
    pub scale: TimeScale,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub ticks: Vec<ScaleTick>,
    pub bars: Vec<ChartBar>,
}

async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>, ApiError> {
    let scale = match query.scale.as_deref() {
        Some(raw) => TimeScale::from_str(raw).map_err(ApiError::invalid)?,
        None => TimeScale::default(),
    };
    let report = state.compute().await?;
    let Some(window) = ChartWindow::from_timelines(&report.timelines, scale) else {
        return Ok(Json(ChartResponse {
            scale,
            start: None,
            end: None,
            ticks: Vec::new(),
            bars: Vec::new(),
        }));
    };

    let bars = report
        .timelines
        .iter()
        .map(|timeline| {
            let geometry = window.bar(timeline);
            ChartBar {
                item_id: timeline.item_id.clone(),
                left: geometry.left,
                width: geometry.width,
                conflict: report
                    .conflicts
                    .iter()
                    .any(|conflict| conflict.item_ids.contains(&timeline.item_id)),
            }
        })
        .collect();
    Ok(Json(ChartResponse {
        scale,
        start: Some(window.start()),
        end: Some(window.end()),
        ticks: window.ticks(),
        bars,
    }))
}
