use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // One row per salon; operating hours and emergency dates are small documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS salons (
            salon_id UUID PRIMARY KEY,
            max_concurrent_bookings INTEGER NOT NULL,
            buffer_minutes INTEGER NOT NULL,
            default_service_duration_minutes INTEGER NOT NULL,
            emergency_capacity_enabled BOOLEAN NOT NULL,
            emergency_dates JSONB NOT NULL DEFAULT '[]',
            operating_hours JSONB NOT NULL,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT positive_capacity CHECK (max_concurrent_bookings >= 1),
            CONSTRAINT positive_duration CHECK (default_service_duration_minutes >= 1),
            CONSTRAINT non_negative_buffer CHECK (buffer_minutes >= 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blocked_ranges (
            salon_id UUID NOT NULL REFERENCES salons(salon_id),
            date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            reason TEXT NULL,
            PRIMARY KEY (salon_id, date, start_time, end_time),
            CONSTRAINT valid_block_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // seq keeps registry order stable for tie-breaking
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS braiders (
            id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            salon_id UUID NOT NULL REFERENCES salons(salon_id),
            name VARCHAR(255) NOT NULL,
            specialties JSONB NOT NULL DEFAULT '[]',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            working_hours JSONB NOT NULL,
            split_percentage SMALLINT NOT NULL,
            time_off JSONB NOT NULL DEFAULT '[]',
            max_daily_bookings INTEGER NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            revision BIGINT NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("ALTER TABLE braiders ADD COLUMN IF NOT EXISTS revision BIGINT NOT NULL DEFAULT 0")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            salon_id UUID NOT NULL REFERENCES salons(salon_id),
            client_ref VARCHAR(255) NOT NULL,
            appointment_date DATE NOT NULL,
            appointment_time TIME NOT NULL,
            duration_minutes INTEGER NOT NULL,
            assigned_braider_id UUID NULL REFERENCES braiders(id),
            preferred_braider_id UUID NULL,
            status VARCHAR(16) NOT NULL,
            service_details JSONB NOT NULL,
            notes JSONB NOT NULL DEFAULT '[]',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT positive_booking_duration CHECK (duration_minutes >= 1)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Conditional-write guard, one counter per salon and date
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS day_revisions (
            salon_id UUID NOT NULL,
            date DATE NOT NULL,
            revision BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (salon_id, date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_bookings_salon_date ON bookings(salon_id, appointment_date)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_braider ON bookings(assigned_braider_id)",
        "CREATE INDEX IF NOT EXISTS idx_braiders_salon_id ON braiders(salon_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
