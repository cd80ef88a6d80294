use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::Result;
use salonsync_core::models::booking::Booking;
use salonsync_core::models::braider::Braider;
use salonsync_core::models::capacity::SalonCapacityConfig;
use salonsync_core::store::{BookingStore, CommitOutcome, DayKey, DaySnapshot, WriteBatch};
use tracing::debug;
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{booking, braider, salon};

/// [`BookingStore`] over PostgreSQL.
///
/// A commit runs in one transaction: every expected day revision is advanced
/// with a conditional `UPDATE` before any booking is written, so two engines
/// sharing the database cannot both commit against the same revision.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn salon_config(&self, salon_id: Uuid) -> Result<Option<SalonCapacityConfig>> {
        salon::get_salon_config(&self.pool, salon_id).await
    }

    async fn save_salon_config(&self, config: &SalonCapacityConfig) -> Result<()> {
        salon::save_salon_config(&self.pool, config).await
    }

    async fn braiders(&self, salon_id: Uuid) -> Result<Vec<Braider>> {
        braider::get_braiders_by_salon_id(&self.pool, salon_id).await
    }

    async fn braider(&self, braider_id: Uuid) -> Result<Option<Braider>> {
        braider::get_braider_by_id(&self.pool, braider_id).await
    }

    async fn save_braider(&self, braider: &Braider, expected_revision: Option<u64>) -> Result<CommitOutcome> {
        let saved = match expected_revision {
            None => braider::insert_braider(&self.pool, braider).await?,
            Some(expected) => braider::update_braider(&self.pool, braider, expected).await?,
        };
        Ok(if saved { CommitOutcome::Committed } else { CommitOutcome::Stale })
    }

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        booking::get_booking_by_id(&self.pool, booking_id).await
    }

    async fn day(&self, key: DayKey) -> Result<DaySnapshot> {
        // Revision first: a write landing between the two reads can only make
        // the snapshot look newer than its revision, which fails the commit.
        let revision = booking::get_day_revision(&self.pool, key).await?;
        let bookings = booking::get_bookings_between(&self.pool, key.salon_id, key.date, key.date).await?;
        Ok(DaySnapshot { revision, bookings })
    }

    async fn bookings_between(&self, salon_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>> {
        if to < from {
            return Ok(Vec::new());
        }
        booking::get_bookings_between(&self.pool, salon_id, from, to).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut expected = batch.expected.clone();
        expected.sort_by_key(|(key, _)| *key);
        for (key, revision) in &expected {
            if !booking::advance_day_revision(&mut tx, *key, *revision).await? {
                debug!(salon_id = %key.salon_id, date = %key.date, revision, "Day revision is stale");
                tx.rollback().await?;
                return Ok(CommitOutcome::Stale);
            }
        }

        for record in &batch.bookings {
            let key = record.day_key();
            if !expected.iter().any(|(expected_key, _)| *expected_key == key) {
                booking::bump_day_revision(&mut tx, key).await?;
            }
            booking::upsert_booking(&mut tx, record).await?;
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }
}
