use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use salonsync_core::engine::BraiderSchedule;
use salonsync_core::models::braider::{Braider, BraiderUpdate, NewBraider, TimeOff};
use salonsync_core::models::service_style::ServiceStyle;
use salonsync_core::scheduling::assignment::BraiderAvailability;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::parse_time;
use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn list_braiders(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
) -> Result<Json<Vec<Braider>>, AppError> {
    Ok(Json(state.engine.braiders(salon_id).await?))
}

#[axum::debug_handler]
pub async fn register_braider(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Json(payload): Json<NewBraider>,
) -> Result<(StatusCode, Json<Braider>), AppError> {
    let braider = state.engine.register_braider(salon_id, payload).await?;
    Ok((StatusCode::CREATED, Json(braider)))
}

#[axum::debug_handler]
pub async fn update_braider(
    State(state): State<Arc<ApiState>>,
    Path(braider_id): Path<Uuid>,
    Json(payload): Json<BraiderUpdate>,
) -> Result<Json<Braider>, AppError> {
    Ok(Json(state.engine.update_braider(braider_id, payload).await?))
}

#[axum::debug_handler]
pub async fn deactivate_braider(
    State(state): State<Arc<ApiState>>,
    Path(braider_id): Path<Uuid>,
) -> Result<Json<Braider>, AppError> {
    Ok(Json(state.engine.deactivate_braider(braider_id).await?))
}

#[axum::debug_handler]
pub async fn add_time_off(
    State(state): State<Arc<ApiState>>,
    Path(braider_id): Path<Uuid>,
    Json(payload): Json<TimeOff>,
) -> Result<Json<Braider>, AppError> {
    Ok(Json(state.engine.add_time_off(braider_id, payload).await?))
}

#[derive(Debug, Deserialize)]
pub struct AvailableBraidersParams {
    pub date: NaiveDate,
    pub time: String,
    pub style: ServiceStyle,
    /// Defaults to the style's standard duration.
    pub duration: Option<u32>,
}

/// Braiders free at the given time, best candidates first.
#[axum::debug_handler]
pub async fn available_braiders(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Query(params): Query<AvailableBraidersParams>,
) -> Result<Json<Vec<BraiderAvailability>>, AppError> {
    let time = parse_time(&params.time)?;
    let ranked = state
        .engine
        .available_braiders(salon_id, params.date, time, params.style, params.duration)
        .await?;
    Ok(Json(ranked))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleParams {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn braider_schedule(
    State(state): State<Arc<ApiState>>,
    Path(braider_id): Path<Uuid>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<BraiderSchedule>, AppError> {
    let schedule = state
        .engine
        .braider_schedule(braider_id, params.from, params.to.unwrap_or(params.from))
        .await?;
    Ok(Json(schedule))
}
