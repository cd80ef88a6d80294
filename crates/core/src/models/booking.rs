use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SalonError;
use crate::models::service_style::ServiceStyle;
use crate::scheduling::TimeWindow;
use crate::store::DayKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Pending and confirmed bookings occupy their time window.
    pub fn holds_capacity(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        !self.holds_capacity()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = SalonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            other => Err(SalonError::Validation(format!("Unknown booking status: {}", other))),
        }
    }
}

/// What the client asked for. Only `style` and the duration override matter
/// to scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub style: ServiceStyle,
    pub size: Option<String>,
    pub length: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_override_minutes: Option<u32>,
}

impl ServiceDetails {
    pub fn new(style: ServiceStyle) -> Self {
        Self {
            style,
            size: None,
            length: None,
            price_cents: None,
            duration_override_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub client_ref: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: u32,
    pub assigned_braider_id: Option<Uuid>,
    pub preferred_braider_id: Option<Uuid>,
    pub status: BookingStatus,
    pub service_details: ServiceDetails,
    #[serde(default)]
    pub notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.appointment_date, self.appointment_time, self.duration_minutes)
    }

    pub fn padded_window(&self, buffer_minutes: u32) -> TimeWindow {
        self.window().padded(buffer_minutes)
    }

    pub fn is_active(&self) -> bool {
        self.status.holds_capacity()
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.salon_id, self.appointment_date)
    }
}

/// Request to create a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub salon_id: Uuid,
    pub client_ref: String,
    pub service_details: ServiceDetails,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub preferred_braider_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Result of a successful creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    /// Bookings already overlapping the new one when it was accepted.
    pub overlapping_bookings: u32,
    pub remaining_capacity: u32,
}

/// Result of a lifecycle command. `changed` is false for idempotent no-ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub booking: Booking,
    pub changed: bool,
}
