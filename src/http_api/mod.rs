use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AssigneePlan, DAILY_CAPACITY, DailyPointsInfo, InMemoryRepository, LoadBearingSet, PlanCache,
    PlanError, PlannerConfig, RepositoryError, SprintPlan, SprintPlanError, SprintPlanner,
    WorkItem, select_load_bearing_items, validation,
};

#[derive(Clone)]
pub struct AppState {
    repository: Arc<RwLock<InMemoryRepository>>,
    cache: Arc<PlanCache>,
    daily_capacity: i64,
}

impl AppState {
    pub fn new(repository: InMemoryRepository) -> Self {
        Self {
            repository: Arc::new(RwLock::new(repository)),
            cache: Arc::new(PlanCache::default()),
            daily_capacity: DAILY_CAPACITY,
        }
    }

    pub fn from_config(repository: InMemoryRepository, config: &PlannerConfig) -> Self {
        Self {
            repository: Arc::new(RwLock::new(repository)),
            cache: Arc::new(PlanCache::with_capacity(config.cache_capacity)),
            daily_capacity: config.daily_capacity,
        }
    }

    fn repository(&self) -> Arc<RwLock<InMemoryRepository>> {
        self.repository.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Configuration(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlanError> for ApiError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::Configuration(_) => ApiError::Configuration(value.to_string()),
            PlanError::Validation(_) | PlanError::DateOutOfRange { .. } => {
                ApiError::Invalid(value.to_string())
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::ItemNotFound(_) => ApiError::NotFound(value.to_string()),
            RepositoryError::InvalidData(_) => ApiError::Invalid(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SprintPlanError> for ApiError {
    fn from(value: SprintPlanError) -> Self {
        match value {
            SprintPlanError::Repository(err) => err.into(),
            SprintPlanError::Plan(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Configuration(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_configuration",
                message,
            ),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Point values arrive as JSON numbers so fractional input can be rejected
/// instead of silently truncated by deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload {
    current_day_points: f64,
    new_work_points: f64,
    #[serde(default)]
    daily_capacity: Option<f64>,
    #[serde(default)]
    anchor_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SprintPlanPayload {
    #[serde(default)]
    anchor_date: Option<NaiveDate>,
    new_work_points: f64,
}

#[derive(Debug, Deserialize)]
struct AnchorQuery {
    #[serde(default)]
    anchor: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn whole_points(field: &str, value: f64) -> Result<i64, ApiError> {
    let points = validation::points_from_f64(field, value)?;
    i64::try_from(points).map_err(|_| ApiError::invalid(format!("{field} is out of range")))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plan", post(plan))
        .route("/items", get(list_items).post(upsert_item))
        .route("/items/:id", delete(delete_item))
        .route("/sprints/:id/items", get(sprint_items))
        .route("/sprints/:id/plan", post(plan_sprint))
        .route("/sprints/:id/assignees/plan", post(plan_assignees))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "sprint capacity API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn plan(
    State(state): State<AppState>,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<DailyPointsInfo>, ApiError> {
    let daily_capacity = match payload.daily_capacity {
        Some(value) => validation::capacity_from_f64(value)?,
        None => state.daily_capacity,
    };
    let current = whole_points("currentDayPoints", payload.current_day_points)?;
    let new_work = whole_points("newWorkPoints", payload.new_work_points)?;
    let anchor = payload.anchor_date.unwrap_or_else(today);
    let plan = state.cache.plan(anchor, current, new_work, daily_capacity)?;
    Ok(Json(plan))
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<WorkItem>> {
    let repository = state.repository();
    let items = {
        let guard = repository.read();
        guard.items().to_vec()
    };
    Json(items)
}

async fn upsert_item(
    State(state): State<AppState>,
    Json(item): Json<WorkItem>,
) -> Result<(StatusCode, Json<WorkItem>), ApiError> {
    let repository = state.repository();
    let replaced = {
        let mut guard = repository.write();
        guard.upsert(item.clone())?
    };
    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(item)))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<WorkItem>, ApiError> {
    let repository = state.repository();
    let deleted = {
        let mut guard = repository.write();
        guard.soft_delete(&item_id, Utc::now())?.clone()
    };
    Ok(Json(deleted))
}

async fn sprint_items(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
    Query(query): Query<AnchorQuery>,
) -> Json<LoadBearingSet> {
    let anchor = query.anchor.unwrap_or_else(today);
    let repository = state.repository();
    let set = {
        let guard = repository.read();
        select_load_bearing_items(guard.items(), &sprint_id, anchor)
    };
    Json(set)
}

async fn plan_sprint(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
    Json(payload): Json<SprintPlanPayload>,
) -> Result<Json<SprintPlan>, ApiError> {
    let new_work = whole_points("newWorkPoints", payload.new_work_points)?;
    let anchor = payload.anchor_date.unwrap_or_else(today);
    let repository = state.repository();
    let plan = {
        let guard = repository.read();
        let planner = SprintPlanner::with_daily_capacity(&*guard, state.daily_capacity);
        planner.plan_sprint(&sprint_id, anchor, new_work)?
    };
    Ok(Json(plan))
}

async fn plan_assignees(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
    Json(payload): Json<SprintPlanPayload>,
) -> Result<Json<AssigneePlan>, ApiError> {
    let new_work = whole_points("newWorkPoints", payload.new_work_points)?;
    let anchor = payload.anchor_date.unwrap_or_else(today);
    let repository = state.repository();
    let plan = {
        let guard = repository.read();
        let planner = SprintPlanner::with_daily_capacity(&*guard, state.daily_capacity);
        planner.plan_assignees(&sprint_id, anchor, new_work)?
    };
    Ok(Json(plan))
}
