use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::Result;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::braider::Braider;
use crate::models::capacity::SalonCapacityConfig;
use crate::store::{BookingStore, CommitOutcome, DayKey, DaySnapshot, WriteBatch};

/// In-process store. Used by tests and by single-node deployments that keep
/// bookings in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    salons: HashMap<Uuid, SalonCapacityConfig>,
    braiders: Vec<Braider>,
    bookings: HashMap<Uuid, Booking>,
    days: BTreeMap<DayKey, Vec<Uuid>>,
    revisions: HashMap<DayKey, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn revision(&self, key: &DayKey) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    fn upsert(&mut self, booking: Booking) {
        let key = booking.day_key();
        if let Some(previous) = self.bookings.get(&booking.id) {
            let old_key = previous.day_key();
            if old_key != key {
                if let Some(ids) = self.days.get_mut(&old_key) {
                    ids.retain(|id| *id != booking.id);
                }
                *self.revisions.entry(old_key).or_insert(0) += 1;
            }
        }

        let ids = self.days.entry(key).or_default();
        if !ids.contains(&booking.id) {
            ids.push(booking.id);
        }
        *self.revisions.entry(key).or_insert(0) += 1;
        self.bookings.insert(booking.id, booking);
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn salon_config(&self, salon_id: Uuid) -> Result<Option<SalonCapacityConfig>> {
        Ok(self.inner.read().await.salons.get(&salon_id).cloned())
    }

    async fn save_salon_config(&self, config: &SalonCapacityConfig) -> Result<()> {
        self.inner
            .write()
            .await
            .salons
            .insert(config.salon_id, config.clone());
        Ok(())
    }

    async fn braiders(&self, salon_id: Uuid) -> Result<Vec<Braider>> {
        let inner = self.inner.read().await;
        Ok(inner
            .braiders
            .iter()
            .filter(|braider| braider.salon_id == salon_id)
            .cloned()
            .collect())
    }

    async fn braider(&self, braider_id: Uuid) -> Result<Option<Braider>> {
        let inner = self.inner.read().await;
        Ok(inner.braiders.iter().find(|b| b.id == braider_id).cloned())
    }

    async fn save_braider(&self, braider: &Braider, expected_revision: Option<u64>) -> Result<CommitOutcome> {
        let mut inner = self.inner.write().await;
        let position = inner.braiders.iter().position(|b| b.id == braider.id);
        match (position, expected_revision) {
            (None, None) => inner.braiders.push(braider.clone()),
            (Some(index), Some(expected)) if inner.braiders[index].revision == expected => {
                inner.braiders[index] = braider.clone();
            }
            _ => return Ok(CommitOutcome::Stale),
        }
        Ok(CommitOutcome::Committed)
    }

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        Ok(self.inner.read().await.bookings.get(&booking_id).cloned())
    }

    async fn day(&self, key: DayKey) -> Result<DaySnapshot> {
        let inner = self.inner.read().await;
        let bookings = inner
            .days
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.bookings.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(DaySnapshot {
            revision: inner.revision(&key),
            bookings,
        })
    }

    async fn bookings_between(&self, salon_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>> {
        if to < from {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        let bookings = inner
            .days
            .range(DayKey::new(salon_id, from)..=DayKey::new(salon_id, to))
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| inner.bookings.get(id).cloned())
            .collect();
        Ok(bookings)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        let mut inner = self.inner.write().await;

        let stale = batch
            .expected
            .iter()
            .any(|(key, revision)| inner.revision(key) != *revision);
        if stale {
            return Ok(CommitOutcome::Stale);
        }

        for (key, _) in &batch.expected {
            *inner.revisions.entry(*key).or_insert(0) += 1;
        }
        for booking in batch.bookings {
            inner.upsert(booking);
        }
        Ok(CommitOutcome::Committed)
    }
}
