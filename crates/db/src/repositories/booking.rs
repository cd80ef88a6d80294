use chrono::NaiveDate;
use eyre::Result;
use salonsync_core::models::booking::Booking;
use salonsync_core::store::DayKey;
use sqlx::types::Json;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbBooking, column_int};

const BOOKING_COLUMNS: &str = "id, salon_id, client_ref, appointment_date, appointment_time, duration_minutes, \
     assigned_braider_id, preferred_braider_id, status, service_details, notes, created_at, updated_at";

pub async fn get_booking_by_id(pool: &Pool<Postgres>, booking_id: Uuid) -> Result<Option<Booking>> {
    let row = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {} FROM bookings WHERE id = $1",
        BOOKING_COLUMNS
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await?;

    row.map(Booking::try_from).transpose()
}

/// Every status, in creation order.
pub async fn get_bookings_between(
    pool: &Pool<Postgres>,
    salon_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Booking>> {
    let rows = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {} FROM bookings \
         WHERE salon_id = $1 AND appointment_date BETWEEN $2 AND $3 \
         ORDER BY appointment_date, seq",
        BOOKING_COLUMNS
    ))
    .bind(salon_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    tracing::debug!("Found {} bookings for salon {} between {} and {}", rows.len(), salon_id, from, to);
    rows.into_iter().map(Booking::try_from).collect()
}

/// Zero for a day that has never been written.
pub async fn get_day_revision(pool: &Pool<Postgres>, key: DayKey) -> Result<u64> {
    let revision = sqlx::query_scalar::<_, i64>(
        "SELECT revision FROM day_revisions WHERE salon_id = $1 AND date = $2",
    )
    .bind(key.salon_id)
    .bind(key.date)
    .fetch_optional(pool)
    .await?;

    Ok(revision.unwrap_or(0) as u64)
}

/// Moves the day from `expected` to `expected + 1`. Returns false if another
/// writer got there first.
pub async fn advance_day_revision(conn: &mut PgConnection, key: DayKey, expected: u64) -> Result<bool> {
    sqlx::query(
        r#"
        INSERT INTO day_revisions (salon_id, date, revision)
        VALUES ($1, $2, 0)
        ON CONFLICT (salon_id, date) DO NOTHING
        "#,
    )
    .bind(key.salon_id)
    .bind(key.date)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query(
        r#"
        UPDATE day_revisions SET revision = revision + 1
        WHERE salon_id = $1 AND date = $2 AND revision = $3
        "#,
    )
    .bind(key.salon_id)
    .bind(key.date)
    .bind(expected as i64)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Unconditional bump for days a batch touches without having read them.
pub async fn bump_day_revision(conn: &mut PgConnection, key: DayKey) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO day_revisions (salon_id, date, revision)
        VALUES ($1, $2, 1)
        ON CONFLICT (salon_id, date) DO UPDATE SET revision = day_revisions.revision + 1
        "#,
    )
    .bind(key.salon_id)
    .bind(key.date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn upsert_booking(conn: &mut PgConnection, booking: &Booking) -> Result<()> {
    tracing::debug!("Saving booking: id={}, status={}", booking.id, booking.status);

    sqlx::query(
        r#"
        INSERT INTO bookings (id, salon_id, client_ref, appointment_date, appointment_time, duration_minutes,
                              assigned_braider_id, preferred_braider_id, status, service_details, notes,
                              created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            appointment_date = EXCLUDED.appointment_date,
            appointment_time = EXCLUDED.appointment_time,
            duration_minutes = EXCLUDED.duration_minutes,
            assigned_braider_id = EXCLUDED.assigned_braider_id,
            status = EXCLUDED.status,
            service_details = EXCLUDED.service_details,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(booking.id)
    .bind(booking.salon_id)
    .bind(&booking.client_ref)
    .bind(booking.appointment_date)
    .bind(booking.appointment_time)
    .bind(column_int(booking.duration_minutes, "duration_minutes")?)
    .bind(booking.assigned_braider_id)
    .bind(booking.preferred_braider_id)
    .bind(booking.status.as_str())
    .bind(Json(&booking.service_details))
    .bind(Json(&booking.notes))
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
