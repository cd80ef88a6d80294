//! # Availability Handlers
//!
//! Read-only views of a salon's capacity: the slot calendar for a date range
//! and the advisory "would this fit" check. Neither reserves anything; a
//! client must still create the booking, which re-checks under the day lock.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use salonsync_core::models::time_slot::TimeSlot;
use salonsync_core::scheduling::availability::{AvailabilityQuery, DEFAULT_GRANULARITY_MINUTES};
use salonsync_core::scheduling::conflict::Admission;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::parse_time;
use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub from: NaiveDate,
    /// Defaults to `from`.
    pub to: Option<NaiveDate>,
    /// Slot length in minutes (default: 60)
    pub granularity: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub salon_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub granularity_minutes: u32,
    pub slots: Vec<TimeSlot>,
}

/// Lists every slot of every open day in the range.
///
/// # Endpoint
///
/// ```text
/// GET /api/salons/:salon_id/availability?from=2030-06-04&to=2030-06-10&granularity=30
/// ```
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let query = AvailabilityQuery::new(params.from, params.to.unwrap_or(params.from))
        .with_granularity(params.granularity.unwrap_or(DEFAULT_GRANULARITY_MINUTES));
    let calendar = state.engine.get_availability(salon_id, query).await?;

    let query = calendar.query();
    Ok(Json(AvailabilityResponse {
        salon_id,
        from: query.from,
        to: query.to,
        granularity_minutes: query.granularity_minutes,
        slots: calendar.slots().collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CapacityCheckParams {
    pub date: NaiveDate,
    pub time: String,
    pub duration: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapacityCheckResponse {
    pub can_accept: bool,
    #[serde(flatten)]
    pub admission: Admission,
}

/// # Endpoint
///
/// ```text
/// GET /api/salons/:salon_id/capacity/check?date=2030-06-04&time=10:00&duration=240
/// ```
#[axum::debug_handler]
pub async fn check_capacity(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Query(params): Query<CapacityCheckParams>,
) -> Result<Json<CapacityCheckResponse>, AppError> {
    let time = parse_time(&params.time)?;
    let admission = state
        .engine
        .can_accept(salon_id, params.date, time, params.duration)
        .await?;

    Ok(Json(CapacityCheckResponse {
        can_accept: admission.is_accept(),
        admission,
    }))
}
