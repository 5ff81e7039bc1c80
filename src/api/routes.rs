use crate::analyzer::overview;
use crate::analyzer::stats::{DailyStats, derive_stats};
use crate::analyzer::timeline::TimelineProjector;
use crate::config::{Config, parse_hhmm};
use crate::entry::EntryForm;
use crate::registry::{ActivityType, all_configs};
use crate::slots::Slot;
use crate::store::{ActivityRecord, ActivityStore};
use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub store: Arc<Mutex<ActivityStore>>,
}

impl ApiState {
    /// Locks the store after re-reading it, so CLI writes made while the
    /// server runs are visible.
    fn store(&self) -> ApiResult<MutexGuard<'_, ActivityStore>> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("activity store lock poisoned")))?;
        store.refresh()?;

        Ok(store)
    }

    fn snapshot(&self) -> ApiResult<Arc<Vec<ActivityRecord>>> {
        Ok(self.store()?.snapshot())
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/types", get(types))
        .route(
            "/api/v1/activities",
            get(activity_list)
                .post(activity_create)
                .delete(activity_clear),
        )
        .route(
            "/api/v1/activities/:id",
            get(activity_get).delete(activity_delete),
        )
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/timeline/:activity_type", get(timeline))
        .route("/api/v1/overview", get(overview_view))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct TypeQuery {
    #[serde(rename = "type")]
    activity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateActivityPayload {
    #[serde(flatten)]
    form: EntryForm,
    slot: Option<usize>,
    time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct ActivitiesPayload {
    count: usize,
    activities: Vec<ActivityRecord>,
}

#[derive(Debug, Serialize)]
struct TypeView {
    #[serde(rename = "type")]
    activity_type: ActivityType,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    description: &'static str,
    target_frequency: u32,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    activity_count: usize,
    now: String,
    utc_offset_hours: i32,
    api_port: u16,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let activity_count = state.store()?.len();

    Ok(Json(StatusPayload {
        activity_count,
        now: state.config.now().to_rfc3339(),
        utc_offset_hours: state.config.utc_offset_hours,
        api_port: state.config.api_port,
    }))
}

async fn types() -> Json<Vec<TypeView>> {
    Json(
        all_configs()
            .into_iter()
            .map(|(activity_type, config)| TypeView {
                activity_type,
                name: config.name,
                icon: config.icon,
                color: config.color,
                description: config.description,
                target_frequency: config.target_frequency,
            })
            .collect(),
    )
}

async fn activity_list(
    State(state): State<ApiState>,
    Query(query): Query<TypeQuery>,
) -> ApiResult<Json<ActivitiesPayload>> {
    let filter = query.activity_type.as_deref().map(parse_type).transpose()?;
    let activities = state
        .snapshot()?
        .iter()
        .filter(|record| filter.is_none_or(|activity_type| record.activity_type == activity_type))
        .cloned()
        .collect::<Vec<_>>();

    Ok(Json(ActivitiesPayload {
        count: activities.len(),
        activities,
    }))
}

async fn activity_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActivityRecord>> {
    state
        .store()?
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No activity found: {id}")))
}

async fn activity_create(
    State(state): State<ApiState>,
    Json(payload): Json<CreateActivityPayload>,
) -> ApiResult<(StatusCode, Json<ActivityRecord>)> {
    let offset = state.config.display_offset();
    let now = state.config.now();

    let adjusted = payload
        .time
        .as_deref()
        .map(parse_hhmm)
        .transpose()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let day = payload
        .date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| now.date_naive());

    let slot = payload
        .slot
        .map(Slot::parse_index)
        .transpose()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let record = payload.form.place(slot, day, adjusted, now, &offset)?;

    state.store()?.add(record.clone())?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn activity_delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActivityRecord>> {
    state
        .store()?
        .remove_by_id(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No activity found: {id}")))
}

async fn activity_clear(
    State(state): State<ApiState>,
    Query(query): Query<TypeQuery>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store()?;

    match query.activity_type.as_deref().map(parse_type).transpose()? {
        Some(activity_type) => {
            let removed = store.remove_by_type(activity_type)?;
            Ok(Json(json!({ "removed": removed, "type": activity_type })))
        }
        None => {
            let removed = store.clear()?;
            Ok(Json(json!({ "removed": removed, "type": null })))
        }
    }
}

async fn stats(State(state): State<ApiState>) -> ApiResult<Json<DailyStats>> {
    let snapshot = state.snapshot()?;
    Ok(Json(derive_stats(&snapshot, Some(state.config.now()))))
}

async fn timeline(
    State(state): State<ApiState>,
    Path(activity_type): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Response> {
    let activity_type = parse_type(&activity_type)?;
    let mut projector = TimelineProjector::new(state.config.display_offset());
    if let Some(day) = query.date.as_deref().map(parse_date).transpose()? {
        projector = projector.for_day(day);
    }

    let snapshot = state.snapshot()?;
    let timeline = projector.project(&snapshot, activity_type, Some(state.config.now()));

    Ok(Json(&timeline).into_response())
}

async fn overview_view(State(state): State<ApiState>) -> ApiResult<Response> {
    let snapshot = state.snapshot()?;
    let projector = TimelineProjector::new(state.config.display_offset());
    let view = overview(&snapshot, Some(state.config.now()), &projector);

    Ok(Json(&view).into_response())
}

fn parse_type(raw: &str) -> ApiResult<ActivityType> {
    raw.parse::<ActivityType>()
        .map_err(|error| ApiError::BadRequest(error.to_string()))
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {input}. Example: 2024-01-01"))
        .map_err(|error| ApiError::BadRequest(error.to_string()))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}
