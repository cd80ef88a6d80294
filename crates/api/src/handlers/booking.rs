//! # Booking Handlers
//!
//! Creation and lifecycle commands. Every command answers with the booking as
//! stored after the command; lifecycle commands also report whether anything
//! changed, so retried requests are safe to replay.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use salonsync_core::models::booking::{
    Booking, BookingReceipt, BookingStatus, CreateBooking, ServiceDetails, TransitionOutcome,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::parse_time;
use crate::{ApiState, middleware::error_handling::AppError};

/// Body of `POST /api/salons/:salon_id/bookings`. The salon comes from the path.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub client_ref: String,
    pub service_details: ServiceDetails,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub preferred_braider_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let request = CreateBooking {
        salon_id,
        client_ref: payload.client_ref,
        service_details: payload.service_details,
        appointment_date: payload.appointment_date,
        appointment_time: parse_time(&payload.appointment_time)?,
        preferred_braider_id: payload.preferred_braider_id,
        notes: payload.notes,
    };

    let receipt = state.engine.create_booking(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsParams {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    Path(salon_id): Path<Uuid>,
    Query(params): Query<ListBookingsParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .engine
        .salon_bookings(salon_id, params.from, params.to.unwrap_or(params.from), params.status)
        .await?;
    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.engine.get_booking(booking_id).await?))
}

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<TransitionOutcome>, AppError> {
    Ok(Json(state.engine.confirm_booking(booking_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    Ok(Json(state.engine.cancel_booking(booking_id, payload.reason).await?))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<TransitionOutcome>, AppError> {
    Ok(Json(state.engine.complete_booking(booking_id).await?))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<TransitionOutcome>, AppError> {
    Ok(Json(state.engine.mark_no_show(booking_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_date: NaiveDate,
    pub new_time: String,
}

#[axum::debug_handler]
pub async fn reschedule_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    let new_time = parse_time(&payload.new_time)?;
    let outcome = state
        .engine
        .reschedule_booking(booking_id, payload.new_date, new_time)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub braider_id: Uuid,
}

#[axum::debug_handler]
pub async fn assign_braider(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.engine.assign_braider(booking_id, payload.braider_id).await?))
}
