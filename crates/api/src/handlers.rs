//! # Request Handlers
//!
//! Thin adapters between HTTP and [`BookingEngine`](salonsync_core::BookingEngine).
//! Each handler extracts its parameters, calls one engine operation and wraps
//! the result in JSON.

pub mod availability;
pub mod booking;
pub mod braider;
pub mod capacity;

use chrono::NaiveTime;
use salonsync_core::errors::SalonError;

/// Accepts `HH:MM` and `HH:MM:SS`.
pub(crate) fn parse_time(value: &str) -> Result<NaiveTime, SalonError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| SalonError::Validation(format!("Invalid time '{}', expected HH:MM", value)))
}
