use eyre::Result;
use salonsync_core::models::capacity::SalonCapacityConfig;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbBlockedRange, DbSalon, column_int};

pub async fn get_salon_config(pool: &Pool<Postgres>, salon_id: Uuid) -> Result<Option<SalonCapacityConfig>> {
    tracing::debug!("Getting capacity settings for salon: {}", salon_id);

    let salon = sqlx::query_as::<_, DbSalon>(
        r#"
        SELECT salon_id, max_concurrent_bookings, buffer_minutes, default_service_duration_minutes,
               emergency_capacity_enabled, emergency_dates, operating_hours, timezone, updated_at
        FROM salons
        WHERE salon_id = $1
        "#,
    )
    .bind(salon_id)
    .fetch_optional(pool)
    .await?;

    let Some(salon) = salon else {
        tracing::debug!("No capacity settings for salon: {}", salon_id);
        return Ok(None);
    };

    let blocked = sqlx::query_as::<_, DbBlockedRange>(
        r#"
        SELECT salon_id, date, start_time, end_time, reason
        FROM blocked_ranges
        WHERE salon_id = $1
        ORDER BY date, start_time
        "#,
    )
    .bind(salon_id)
    .fetch_all(pool)
    .await?;

    salon.into_config(blocked).map(Some)
}

/// Replaces the salon row and its blocked ranges in one transaction.
pub async fn save_salon_config(pool: &Pool<Postgres>, config: &SalonCapacityConfig) -> Result<()> {
    tracing::debug!("Saving capacity settings for salon: {}", config.salon_id);
    let mut tx = pool.begin().await?;

    let max_concurrent = column_int(config.max_concurrent_bookings, "max_concurrent_bookings")?;
    let buffer = column_int(config.buffer_minutes, "buffer_minutes")?;
    let duration = column_int(config.default_service_duration_minutes, "default_service_duration_minutes")?;

    sqlx::query(
        r#"
        INSERT INTO salons (salon_id, max_concurrent_bookings, buffer_minutes, default_service_duration_minutes,
                            emergency_capacity_enabled, emergency_dates, operating_hours, timezone, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (salon_id) DO UPDATE SET
            max_concurrent_bookings = EXCLUDED.max_concurrent_bookings,
            buffer_minutes = EXCLUDED.buffer_minutes,
            default_service_duration_minutes = EXCLUDED.default_service_duration_minutes,
            emergency_capacity_enabled = EXCLUDED.emergency_capacity_enabled,
            emergency_dates = EXCLUDED.emergency_dates,
            operating_hours = EXCLUDED.operating_hours,
            timezone = EXCLUDED.timezone,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(config.salon_id)
    .bind(max_concurrent)
    .bind(buffer)
    .bind(duration)
    .bind(config.emergency_capacity_enabled)
    .bind(Json(&config.emergency_dates))
    .bind(Json(&config.operating_hours))
    .bind(config.timezone.name())
    .bind(config.updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM blocked_ranges WHERE salon_id = $1")
        .bind(config.salon_id)
        .execute(&mut *tx)
        .await?;

    for range in &config.blocked_ranges {
        sqlx::query(
            r#"
            INSERT INTO blocked_ranges (salon_id, date, start_time, end_time, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(config.salon_id)
        .bind(range.date)
        .bind(range.start_time)
        .bind(range.end_time)
        .bind(range.reason.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
