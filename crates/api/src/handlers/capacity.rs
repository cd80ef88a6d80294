use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use salonsync_core::errors::SalonError;
use salonsync_core::models::capacity::{BlockedRange, CapacitySettingsUpdate, SalonCapacityConfig};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::parse_time;
use crate::{ApiState, middleware::error_handling::AppError};

/// Creates default settings for a new salon. Repeating the call returns the
/// existing settings unchanged.
#[axum::debug_handler]
pub async fn onboard_salon(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SalonCapacityConfig>), AppError> {
    let config = state.engine.onboard_salon(salon_id).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

#[axum::debug_handler]
pub async fn get_capacity(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
) -> Result<Json<SalonCapacityConfig>, AppError> {
    Ok(Json(state.engine.capacity_settings(salon_id).await?))
}

#[axum::debug_handler]
pub async fn update_capacity(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Json(payload): Json<CapacitySettingsUpdate>,
) -> Result<Json<SalonCapacityConfig>, AppError> {
    let config = state.engine.update_capacity_settings(salon_id, payload).await?;
    Ok(Json(config))
}

#[axum::debug_handler]
pub async fn add_block(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Json(payload): Json<BlockedRange>,
) -> Result<Json<SalonCapacityConfig>, AppError> {
    Ok(Json(state.engine.block_range(salon_id, payload).await?))
}

#[derive(Debug, Deserialize)]
pub struct UnblockParams {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

#[axum::debug_handler]
pub async fn remove_block(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Query(params): Query<UnblockParams>,
) -> Result<StatusCode, AppError> {
    let start_time = parse_time(&params.start_time)?;
    let end_time = parse_time(&params.end_time)?;

    if state
        .engine
        .unblock_range(salon_id, params.date, start_time, end_time)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SalonError::NotFound(format!(
            "Blocked range {} {}-{}",
            params.date, params.start_time, params.end_time
        ))
        .into())
    }
}

#[derive(Debug, Deserialize)]
pub struct EmergencyRequest {
    pub date: NaiveDate,
    pub active: bool,
}

#[axum::debug_handler]
pub async fn set_emergency(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Json(payload): Json<EmergencyRequest>,
) -> Result<Json<SalonCapacityConfig>, AppError> {
    let config = state
        .engine
        .set_emergency_override(salon_id, payload.date, payload.active)
        .await?;
    Ok(Json(config))
}
