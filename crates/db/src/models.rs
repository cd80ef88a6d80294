use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use eyre::{Report, Result, eyre};
use salonsync_core::models::booking::{Booking, BookingStatus, ServiceDetails};
use salonsync_core::models::braider::{Braider, TimeOff};
use salonsync_core::models::capacity::{BlockedRange, SalonCapacityConfig};
use salonsync_core::models::hours::WeeklyHours;
use salonsync_core::models::service_style::ServiceStyle;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSalon {
    pub salon_id: Uuid,
    pub max_concurrent_bookings: i32,
    pub buffer_minutes: i32,
    pub default_service_duration_minutes: i32,
    pub emergency_capacity_enabled: bool,
    pub emergency_dates: Json<BTreeSet<NaiveDate>>,
    pub operating_hours: Json<WeeklyHours>,
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBlockedRange {
    pub salon_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBraider {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    pub specialties: Json<BTreeSet<ServiceStyle>>,
    pub is_active: bool,
    pub working_hours: Json<WeeklyHours>,
    pub split_percentage: i16,
    pub time_off: Json<Vec<TimeOff>>,
    pub max_daily_bookings: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub revision: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub client_ref: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i32,
    pub assigned_braider_id: Option<Uuid>,
    pub preferred_braider_id: Option<Uuid>,
    pub status: String,
    pub service_details: Json<ServiceDetails>,
    pub notes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn unsigned(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| eyre!("Negative value {} in column {}", value, column))
}

pub(crate) fn column_int(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| eyre!("Value {} does not fit column {}", value, column))
}

pub(crate) fn column_bigint(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| eyre!("Value {} does not fit column {}", value, column))
}

impl DbSalon {
    pub fn into_config(self, blocked: Vec<DbBlockedRange>) -> Result<SalonCapacityConfig> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|e| eyre!("Invalid timezone {}: {}", self.timezone, e))?;

        Ok(SalonCapacityConfig {
            salon_id: self.salon_id,
            max_concurrent_bookings: unsigned(self.max_concurrent_bookings, "max_concurrent_bookings")?,
            buffer_minutes: unsigned(self.buffer_minutes, "buffer_minutes")?,
            default_service_duration_minutes: unsigned(
                self.default_service_duration_minutes,
                "default_service_duration_minutes",
            )?,
            emergency_capacity_enabled: self.emergency_capacity_enabled,
            emergency_dates: self.emergency_dates.0,
            blocked_ranges: blocked.into_iter().map(BlockedRange::from).collect(),
            operating_hours: self.operating_hours.0,
            timezone,
            updated_at: self.updated_at,
        })
    }
}

impl From<DbBlockedRange> for BlockedRange {
    fn from(row: DbBlockedRange) -> Self {
        BlockedRange {
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            reason: row.reason,
        }
    }
}

impl TryFrom<DbBraider> for Braider {
    type Error = Report;

    fn try_from(row: DbBraider) -> Result<Self> {
        Ok(Braider {
            id: row.id,
            salon_id: row.salon_id,
            name: row.name,
            specialties: row.specialties.0,
            is_active: row.is_active,
            working_hours: row.working_hours.0,
            split_percentage: u8::try_from(row.split_percentage)
                .map_err(|_| eyre!("Invalid split percentage {}", row.split_percentage))?,
            time_off: row.time_off.0,
            max_daily_bookings: row
                .max_daily_bookings
                .map(|max| unsigned(max, "max_daily_bookings"))
                .transpose()?,
            created_at: row.created_at,
            revision: u64::try_from(row.revision)
                .map_err(|_| eyre!("Negative braider revision {}", row.revision))?,
        })
    }
}

impl TryFrom<DbBooking> for Booking {
    type Error = Report;

    fn try_from(row: DbBooking) -> Result<Self> {
        let status: BookingStatus = row.status.parse().map_err(Report::new)?;

        Ok(Booking {
            id: row.id,
            salon_id: row.salon_id,
            client_ref: row.client_ref,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            duration_minutes: unsigned(row.duration_minutes, "duration_minutes")?,
            assigned_braider_id: row.assigned_braider_id,
            preferred_braider_id: row.preferred_braider_id,
            status,
            service_details: row.service_details.0,
            notes: row.notes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
