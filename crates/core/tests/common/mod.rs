#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use fake::Fake;
use fake::faker::name::en::Name;
use salonsync_core::clock::FixedClock;
use salonsync_core::models::booking::{Booking, BookingStatus, CreateBooking, ServiceDetails};
use salonsync_core::models::braider::Braider;
use salonsync_core::models::capacity::SalonCapacityConfig;
use salonsync_core::models::service_style::ServiceStyle;
use salonsync_core::store::MemoryStore;
use salonsync_core::{BookingEngine, EngineSettings};
use uuid::Uuid;

/// A Tuesday, inside the default Monday to Saturday hours.
pub fn tuesday() -> NaiveDate {
    date(2030, 6, 4)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(time(hour, minute))
}

/// Salon-local "now" well before every test date.
pub fn long_ago() -> NaiveDateTime {
    at(date(2030, 1, 1), 0, 0)
}

pub fn utc(local: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&local)
}

pub fn config(max: u32, buffer: u32) -> SalonCapacityConfig {
    let mut config = SalonCapacityConfig::new(Uuid::new_v4());
    config.max_concurrent_bookings = max;
    config.buffer_minutes = buffer;
    config
}

pub fn client() -> String {
    Name().fake()
}

pub fn booking(salon_id: Uuid, date: NaiveDate, start: NaiveTime, minutes: u32) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        salon_id,
        client_ref: client(),
        appointment_date: date,
        appointment_time: start,
        duration_minutes: minutes,
        assigned_braider_id: None,
        preferred_braider_id: None,
        status: BookingStatus::Confirmed,
        service_details: ServiceDetails::new(ServiceStyle::BoxBraids),
        notes: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn with_status(mut booking: Booking, status: BookingStatus) -> Booking {
    booking.status = status;
    booking
}

pub fn assigned(mut booking: Booking, braider: &Braider) -> Booking {
    booking.assigned_braider_id = Some(braider.id);
    booking
}

pub fn braider(salon_id: Uuid, name: &str, specialties: &[ServiceStyle]) -> Braider {
    let mut braider = Braider::new(salon_id, name);
    braider.specialties = specialties.iter().copied().collect();
    braider
}

pub fn request(salon_id: Uuid, style: ServiceStyle, date: NaiveDate, start: NaiveTime) -> CreateBooking {
    CreateBooking {
        salon_id,
        client_ref: client(),
        service_details: ServiceDetails::new(style),
        appointment_date: date,
        appointment_time: start,
        preferred_braider_id: None,
        notes: None,
    }
}

pub fn request_for(salon_id: Uuid, date: NaiveDate, start: NaiveTime, minutes: u32) -> CreateBooking {
    let mut request = request(salon_id, ServiceStyle::Custom, date, start);
    request.service_details.duration_override_minutes = Some(minutes);
    request
}

pub struct Harness {
    pub engine: Arc<BookingEngine>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub salon_id: Uuid,
}

/// Engine over a fresh in-memory store with one onboarded salon, clock set to
/// the start of 2030.
pub async fn harness(settings: EngineSettings) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(utc(long_ago())));
    let engine = Arc::new(BookingEngine::with_clock(store.clone(), clock.clone(), settings));
    let salon_id = Uuid::new_v4();
    engine.onboard_salon(salon_id).await.unwrap();

    Harness {
        engine,
        store,
        clock,
        salon_id,
    }
}
