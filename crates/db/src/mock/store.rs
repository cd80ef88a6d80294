use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use salonsync_core::models::booking::Booking;
use salonsync_core::models::braider::Braider;
use salonsync_core::models::capacity::SalonCapacityConfig;
use salonsync_core::store::{BookingStore, CommitOutcome, DayKey, DaySnapshot, WriteBatch};
use uuid::Uuid;

// Mock store for exercising engine failure paths
mock! {
    pub Store {}

    #[async_trait]
    impl BookingStore for Store {
        async fn salon_config(&self, salon_id: Uuid) -> eyre::Result<Option<SalonCapacityConfig>>;

        async fn save_salon_config(&self, config: &SalonCapacityConfig) -> eyre::Result<()>;

        async fn braiders(&self, salon_id: Uuid) -> eyre::Result<Vec<Braider>>;

        async fn braider(&self, braider_id: Uuid) -> eyre::Result<Option<Braider>>;

        async fn save_braider(
            &self,
            braider: &Braider,
            expected_revision: Option<u64>,
        ) -> eyre::Result<CommitOutcome>;

        async fn booking(&self, booking_id: Uuid) -> eyre::Result<Option<Booking>>;

        async fn day(&self, key: DayKey) -> eyre::Result<DaySnapshot>;

        async fn bookings_between(
            &self,
            salon_id: Uuid,
            from: NaiveDate,
            to: NaiveDate,
        ) -> eyre::Result<Vec<Booking>>;

        async fn commit(&self, batch: WriteBatch) -> eyre::Result<CommitOutcome>;
    }
}
