#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use fake::Fake;
use fake::faker::name::en::Name;
use salonsync_api::{ApiState, router};
use salonsync_core::clock::FixedClock;
use salonsync_core::store::MemoryStore;
use salonsync_core::{BookingEngine, EngineSettings};
use serde_json::{Value, json};
use uuid::Uuid;

/// A Tuesday, inside the default Monday to Saturday hours.
pub const TUESDAY: &str = "2030-06-04";

pub struct TestContext {
    pub server: TestServer,
    pub clock: Arc<FixedClock>,
    pub salon_id: Uuid,
}

impl TestContext {
    /// Server over an in-memory engine, clock parked at the start of 2030.
    /// The salon is not onboarded yet.
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));
        let engine = BookingEngine::with_clock(Arc::new(MemoryStore::new()), clock.clone(), settings);
        let state = Arc::new(ApiState { engine });

        Self {
            server: TestServer::new(router(state)).unwrap(),
            clock,
            salon_id: Uuid::new_v4(),
        }
    }

    /// Onboards the salon and sets its concurrent ceiling.
    pub async fn onboarded(max_concurrent: u32) -> Self {
        let ctx = Self::new();
        ctx.server.post(&ctx.capacity_path()).await.assert_status(axum::http::StatusCode::CREATED);
        ctx.server
            .put(&ctx.capacity_path())
            .json(&json!({ "max_concurrent_bookings": max_concurrent }))
            .await
            .assert_status_ok();
        ctx
    }

    pub fn capacity_path(&self) -> String {
        format!("/api/salons/{}/capacity", self.salon_id)
    }

    pub fn bookings_path(&self) -> String {
        format!("/api/salons/{}/bookings", self.salon_id)
    }

    pub fn braiders_path(&self) -> String {
        format!("/api/salons/{}/braiders", self.salon_id)
    }

    /// Books a custom service of `minutes` at `time` on [`TUESDAY`].
    pub async fn book(&self, time: &str, minutes: u32) -> axum_test::TestResponse {
        self.server
            .post(&self.bookings_path())
            .json(&booking_body(TUESDAY, time, minutes))
            .await
    }
}

pub fn booking_body(date: &str, time: &str, minutes: u32) -> Value {
    let client: String = Name().fake();
    json!({
        "client_ref": client,
        "service_details": {
            "style": "Custom",
            "duration_override_minutes": minutes,
        },
        "appointment_date": date,
        "appointment_time": time,
    })
}
