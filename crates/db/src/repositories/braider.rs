use eyre::Result;
use salonsync_core::models::braider::Braider;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbBraider, column_bigint, column_int};

const BRAIDER_COLUMNS: &str = "id, salon_id, name, specialties, is_active, working_hours, split_percentage, \
     time_off, max_daily_bookings, created_at, revision";

pub async fn get_braiders_by_salon_id(pool: &Pool<Postgres>, salon_id: Uuid) -> Result<Vec<Braider>> {
    let rows = sqlx::query_as::<_, DbBraider>(&format!(
        "SELECT {} FROM braiders WHERE salon_id = $1 ORDER BY seq",
        BRAIDER_COLUMNS
    ))
    .bind(salon_id)
    .fetch_all(pool)
    .await?;

    tracing::debug!("Found {} braiders for salon: {}", rows.len(), salon_id);
    rows.into_iter().map(Braider::try_from).collect()
}

pub async fn get_braider_by_id(pool: &Pool<Postgres>, braider_id: Uuid) -> Result<Option<Braider>> {
    let row = sqlx::query_as::<_, DbBraider>(&format!(
        "SELECT {} FROM braiders WHERE id = $1",
        BRAIDER_COLUMNS
    ))
    .bind(braider_id)
    .fetch_optional(pool)
    .await?;

    row.map(Braider::try_from).transpose()
}

/// Returns `false` when a braider with this id already exists.
pub async fn insert_braider(pool: &Pool<Postgres>, braider: &Braider) -> Result<bool> {
    tracing::debug!("Registering braider: id={}, name={}", braider.id, braider.name);

    let result = sqlx::query(
        r#"
        INSERT INTO braiders (id, salon_id, name, specialties, is_active, working_hours,
                              split_percentage, time_off, max_daily_bookings, created_at, revision)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(braider.id)
    .bind(braider.salon_id)
    .bind(&braider.name)
    .bind(Json(&braider.specialties))
    .bind(braider.is_active)
    .bind(Json(&braider.working_hours))
    .bind(i16::from(braider.split_percentage))
    .bind(Json(&braider.time_off))
    .bind(max_daily(braider)?)
    .bind(braider.created_at)
    .bind(column_bigint(braider.revision, "revision")?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns `false` when the stored row is no longer at `expected_revision`.
pub async fn update_braider(pool: &Pool<Postgres>, braider: &Braider, expected_revision: u64) -> Result<bool> {
    tracing::debug!(
        "Updating braider: id={}, revision {} -> {}",
        braider.id,
        expected_revision,
        braider.revision
    );

    let result = sqlx::query(
        r#"
        UPDATE braiders SET
            name = $2,
            specialties = $3,
            is_active = $4,
            working_hours = $5,
            split_percentage = $6,
            time_off = $7,
            max_daily_bookings = $8,
            revision = $9
        WHERE id = $1 AND revision = $10
        "#,
    )
    .bind(braider.id)
    .bind(&braider.name)
    .bind(Json(&braider.specialties))
    .bind(braider.is_active)
    .bind(Json(&braider.working_hours))
    .bind(i16::from(braider.split_percentage))
    .bind(Json(&braider.time_off))
    .bind(max_daily(braider)?)
    .bind(column_bigint(braider.revision, "revision")?)
    .bind(column_bigint(expected_revision, "revision")?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn max_daily(braider: &Braider) -> Result<Option<i32>> {
    braider
        .max_daily_bookings
        .map(|max| column_int(max, "max_daily_bookings"))
        .transpose()
}
