use crate::errors::{AppError, TaskError};
use crate::models::{
    AppData, DayScore, MoveRequest, RecordRequest, RecordResponse, ScoreBand, SeriesResponse,
    StatusResponse, TaskDefinition, TaskForm, WeekQuery, WeekResponse, date_key, parse_date_key,
};
use crate::scorer::score_date;
use crate::state::AppState;
use crate::stats::{build_history, build_week, build_week_series, describe_series, week_start};
use crate::storage::{persist_data, read_raw};
use crate::tasks;
use crate::ui::render_index;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> Result<Html<String>, AppError> {
    let monday = resolve_week(&query)?;
    let data = state.data.lock().await;
    let week = build_week(&data, monday);
    let chart = describe_series(build_week_series(&data, monday));
    Ok(Html(render_index(&week, &chart, &data.config)))
}

pub async fn data_file(State(state): State<AppState>) -> Result<Response, AppError> {
    match read_raw(&state.data_path).await? {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response()),
        None => Err(AppError::not_found("no data saved yet")),
    }
}

pub async fn save_document(State(state): State<AppState>, body: Bytes) -> Result<&'static str, AppError> {
    let incoming: AppData = serde_json::from_slice(&body).map_err(|err| {
        warn!("rejected save payload: {err}");
        AppError::internal(err)
    })?;
    replace_document(&state, incoming).await?;
    Ok("Saved")
}

pub async fn heartbeat(State(state): State<AppState>) -> StatusCode {
    state.heartbeat.beat().await;
    StatusCode::OK
}

pub async fn load(State(state): State<AppState>) -> Json<AppData> {
    let data = state.data.lock().await;
    Json(data.clone())
}

pub async fn save(
    State(state): State<AppState>,
    Json(payload): Json<AppData>,
) -> Result<Json<StatusResponse>, AppError> {
    replace_document(&state, payload).await?;
    Ok(Json(StatusResponse { status: "success" }))
}

pub async fn get_score(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayScore>, AppError> {
    let date = parse_date(&date)?;
    let data = state.data.lock().await;
    Ok(Json(score_date(&data.config, date, data.record(date))))
}

pub async fn get_week(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekResponse>, AppError> {
    let monday = resolve_week(&query)?;
    let data = state.data.lock().await;
    Ok(Json(WeekResponse {
        week: build_week(&data, monday),
        chart: describe_series(build_week_series(&data, monday)),
    }))
}

pub async fn get_history(State(state): State<AppState>) -> Json<SeriesResponse> {
    let data = state.data.lock().await;
    Json(describe_series(build_history(&data)))
}

pub async fn set_record(
    State(state): State<AppState>,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<RecordResponse>, AppError> {
    let mut data = state.data.lock().await;
    let date = tasks::set_value(&mut data, &payload.date, &payload.task, payload.value)?;
    persist_data(&state.data_path, &data).await?;

    let score = score_date(&data.config, date, data.record(date));
    Ok(Json(RecordResponse {
        date: date_key(date),
        band: ScoreBand::of(score.percent),
        score,
    }))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskDefinition>> {
    let data = state.data.lock().await;
    Json(data.config.clone())
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(form): Json<TaskForm>,
) -> Result<(StatusCode, Json<Vec<TaskDefinition>>), AppError> {
    let task = form.into_task();
    let mut data = state.data.lock().await;
    let index = tasks::add_task(&mut data, task)?;
    info!("added task '{}' at position {index}", data.config[index].name);
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(data.config.clone())))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(form): Json<TaskForm>,
) -> Result<Json<Vec<TaskDefinition>>, AppError> {
    let task = form.into_task();
    let mut data = state.data.lock().await;
    tasks::update_task(&mut data, index, task)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(data.config.clone()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<TaskDefinition>>, AppError> {
    let mut data = state.data.lock().await;
    let removed = tasks::delete_task(&mut data, index)?;
    info!("deleted task '{}'", removed.name);
    persist_data(&state.data_path, &data).await?;
    Ok(Json(data.config.clone()))
}

pub async fn move_task(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<Vec<TaskDefinition>>, AppError> {
    let mut data = state.data.lock().await;
    tasks::move_task(&mut data, index, payload.direction)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(data.config.clone()))
}

async fn replace_document(state: &AppState, incoming: AppData) -> Result<(), AppError> {
    let mut data = state.data.lock().await;
    *data = incoming;
    persist_data(&state.data_path, &data).await
}

fn resolve_week(query: &WeekQuery) -> Result<NaiveDate, AppError> {
    let requested = query.start.as_deref().or(query.week.as_deref());
    let date = match requested {
        Some(raw) if !raw.trim().is_empty() => parse_date(raw)?,
        _ => Local::now().date_naive(),
    };
    Ok(week_start(date))
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_date_key(raw).ok_or_else(|| TaskError::InvalidDate(raw.to_string()).into())
}
