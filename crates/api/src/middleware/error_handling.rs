//! # Error Handling Middleware
//!
//! Maps engine errors to HTTP status codes and JSON error bodies so every
//! endpoint reports failures the same way:
//!
//! ```json
//! { "error": "Capacity exceeded: 2 overlapping booking(s) against a ceiling of 2",
//!   "kind": "capacity_exceeded",
//!   "retryable": false }
//! ```
//!
//! Rejections also carry their typed payload under `"rejection"`.

use axum::{
    BoxError, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use salonsync_core::errors::{Rejection, SalonError};
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
#[derive(Debug)]
pub struct AppError(pub SalonError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SalonError::Rejected(rejection) => match rejection {
                Rejection::CapacityExceeded { .. }
                | Rejection::SlotBlocked { .. }
                | Rejection::BraiderUnavailable { .. }
                | Rejection::ConcurrentModification => StatusCode::CONFLICT,
                Rejection::PastSlot
                | Rejection::OutsideOperatingHours
                | Rejection::NoneQualified { .. }
                | Rejection::TransitionInvalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            SalonError::NotFound(_) => StatusCode::NOT_FOUND,
            SalonError::Validation(_) => StatusCode::BAD_REQUEST,
            SalonError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            SalonError::Database(_) | SalonError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.0 {
            SalonError::Rejected(rejection) => rejection.kind(),
            SalonError::NotFound(_) => "not_found",
            SalonError::Validation(_) => "validation",
            SalonError::Timeout(_) => "timeout",
            SalonError::Database(_) => "database",
            SalonError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        let mut body = json!({
            "error": self.0.to_string(),
            "kind": self.kind(),
            "retryable": self.0.is_retryable(),
        });
        if let Some(rejection) = self.0.rejection() {
            body["rejection"] = json!(rejection);
        }

        (status, Json(body)).into_response()
    }
}

/// Allows `?` on engine results inside handlers.
impl From<SalonError> for AppError {
    fn from(err: SalonError) -> Self {
        AppError(err)
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError(SalonError::Rejected(rejection))
    }
}

/// Storage failures surfacing outside the engine.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SalonError::Database(err))
    }
}

/// Converts a failure of the request timeout layer into a response.
pub async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError(SalonError::Timeout("request to complete".to_string())).into_response()
    } else {
        AppError(SalonError::Internal(err)).into_response()
    }
}
