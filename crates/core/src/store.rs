//! # Booking Store
//!
//! The persistence boundary of the engine. Bookings are append-only records
//! whose status is the only field lifecycle actions change; nothing is ever
//! physically removed.
//!
//! Every `(salon, date)` pair carries a revision counter. The engine reads a
//! [`DaySnapshot`], makes its decision against it, and commits a [`WriteBatch`]
//! that only applies if the revisions it observed are still current. This
//! turns check-then-insert into a conditional write that is safe across
//! processes, not just across tasks.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::braider::Braider;
use crate::models::capacity::SalonCapacityConfig;

pub use memory::MemoryStore;

/// Serialization key for booking mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey {
    pub salon_id: Uuid,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(salon_id: Uuid, date: NaiveDate) -> Self {
        Self { salon_id, date }
    }
}

/// All bookings of one salon on one date, with the revision they were read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySnapshot {
    pub revision: u64,
    /// Every status, in creation order.
    pub bookings: Vec<Booking>,
}

impl DaySnapshot {
    pub fn find(&self, booking_id: Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|booking| booking.id == booking_id)
    }
}

/// Booking upserts guarded by the day revisions they were decided against.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub expected: Vec<(DayKey, u64)>,
    pub bookings: Vec<Booking>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, key: DayKey, revision: u64) -> Self {
        if !self.expected.iter().any(|(existing, _)| *existing == key) {
            self.expected.push((key, revision));
        }
        self
    }

    pub fn put(mut self, booking: Booking) -> Self {
        self.bookings.push(booking);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// An expected revision moved on; nothing was written.
    Stale,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn salon_config(&self, salon_id: Uuid) -> Result<Option<SalonCapacityConfig>>;

    async fn save_salon_config(&self, config: &SalonCapacityConfig) -> Result<()>;

    /// Registry order: oldest registration first.
    async fn braiders(&self, salon_id: Uuid) -> Result<Vec<Braider>>;

    async fn braider(&self, braider_id: Uuid) -> Result<Option<Braider>>;

    /// Inserts when `expected_revision` is `None` and the id is new. Otherwise
    /// replaces the stored braider only while it is still at
    /// `expected_revision`.
    async fn save_braider(&self, braider: &Braider, expected_revision: Option<u64>) -> Result<CommitOutcome>;

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>>;

    async fn day(&self, key: DayKey) -> Result<DaySnapshot>;

    /// Bookings of every status with `from <= date <= to`.
    async fn bookings_between(&self, salon_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>>;

    /// Applies the batch atomically if every expected revision still matches,
    /// bumping the revision of every day it touches.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome>;
}
