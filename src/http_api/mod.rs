use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::{
    BackupPayload, CourseDayConfig, DayView, Schedule, ScheduleError, ScheduleStore,
    calendar::parse_iso_date, ingest, parse_backup,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<ScheduleStore>>,
}

impl AppState {
    pub fn new(store: ScheduleStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_shared(store: Arc<RwLock<ScheduleStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Arc<RwLock<ScheduleStore>> {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    ConfirmationRequired,
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::InputFormat(message) => ApiError::Invalid(message),
            ScheduleError::Persistence(err) => {
                error!(error = %err, "persisting schedule failed");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::ConfirmationRequired => (
                StatusCode::PRECONDITION_FAILED,
                "confirmation_required",
                "destructive operation requires confirm=true".to_string(),
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Confirm {
    #[serde(default)]
    confirm: bool,
}

impl Confirm {
    fn require(&self) -> Result<(), ApiError> {
        if self.confirm {
            Ok(())
        } else {
            Err(ApiError::ConfirmationRequired)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViewParams {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TogglePayload {
    course: String,
    day: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule", get(get_schedule).delete(clear_schedule))
        .route("/schedule/merge", post(merge_schedule))
        .route(
            "/schedule/days/:day_index/courses/:course_index",
            delete(delete_instance),
        )
        .route("/courses", get(list_courses))
        .route("/courses/:name", delete(delete_course))
        .route("/config", get(get_config).put(put_config))
        .route("/config/toggle", post(toggle_day))
        .route("/view", get(view_day))
        .route("/backup", get(export_backup))
        .route("/backup/import", post(import_backup))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, store: ScheduleStore) -> std::io::Result<()> {
    let state = AppState::new(store);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_schedule(State(state): State<AppState>) -> Json<Schedule> {
    info!("GET /schedule");
    let store = state.store();
    let schedule = store.read().schedule().clone();
    Json(schedule)
}

async fn merge_schedule(
    State(state): State<AppState>,
    Json(incoming): Json<Value>,
) -> Result<Json<Schedule>, ApiError> {
    info!("POST /schedule/merge");
    let store = state.store();
    let mut guard = store.write();
    let merged = guard.merge(&incoming)?.clone();
    Ok(Json(merged))
}

async fn clear_schedule(
    State(state): State<AppState>,
    Query(confirm): Query<Confirm>,
) -> Result<StatusCode, ApiError> {
    info!("DELETE /schedule");
    confirm.require()?;
    state.store().write().clear()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_instance(
    State(state): State<AppState>,
    Path((day_index, course_index)): Path<(usize, usize)>,
    Query(confirm): Query<Confirm>,
) -> Result<Json<Value>, ApiError> {
    info!("DELETE /schedule/days/{}/courses/{}", day_index, course_index);
    confirm.require()?;
    let removed = state.store().write().delete_instance(day_index, course_index)?;
    Ok(Json(json!({ "removed": removed })))
}

async fn list_courses(State(state): State<AppState>) -> Json<Vec<String>> {
    info!("GET /courses");
    Json(state.store().read().course_names())
}

async fn delete_course(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(confirm): Query<Confirm>,
) -> Result<Json<Value>, ApiError> {
    info!("DELETE /courses/{}", name);
    confirm.require()?;
    let removed = state.store().write().delete_course_everywhere(&name)?;
    Ok(Json(json!({ "course": name.trim(), "removed": removed })))
}

async fn get_config(State(state): State<AppState>) -> Json<CourseDayConfig> {
    info!("GET /config");
    Json(state.store().read().day_config().clone())
}

async fn put_config(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CourseDayConfig>, ApiError> {
    info!("PUT /config");
    if !payload.is_object() {
        return Err(ApiError::invalid("course day config must be an object"));
    }
    let config = ingest::normalize_day_config(&payload);
    state.store().write().set_day_config(config.clone())?;
    Ok(Json(config))
}

async fn toggle_day(
    State(state): State<AppState>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<Value>, ApiError> {
    info!("POST /config/toggle");
    if payload.course.trim().is_empty() || payload.day.trim().is_empty() {
        return Err(ApiError::invalid("course and day must not be empty"));
    }
    let days = state
        .store()
        .write()
        .toggle_day(&payload.course, &payload.day)?;
    Ok(Json(json!({ "course": payload.course.trim(), "days": days })))
}

async fn view_day(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Json<DayView>, ApiError> {
    info!("GET /view");
    let date = match params.date.as_deref() {
        Some(raw) => parse_iso_date(raw)
            .ok_or_else(|| ApiError::invalid(format!("invalid date '{raw}', expected YYYY-MM-DD")))?,
        None => Local::now().date_naive(),
    };
    Ok(Json(state.store().read().view_for_date(date)))
}

async fn export_backup(State(state): State<AppState>) -> Result<Response, ApiError> {
    info!("GET /backup");
    let payload = {
        let store = state.store();
        let guard = store.read();
        BackupPayload::new(guard.schedule(), guard.day_config(), Utc::now())
    };
    let body = payload
        .to_pretty_json()
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        payload.file_name()
    ))
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn import_backup(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Schedule>, ApiError> {
    info!("POST /backup/import");
    let backup = parse_backup(&payload)?;
    let store = state.store();
    let mut guard = store.write();
    guard.restore(backup)?;
    Ok(Json(guard.schedule().clone()))
}
