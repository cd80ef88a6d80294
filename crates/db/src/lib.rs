//! # SalonSync Database
//!
//! PostgreSQL persistence for the booking engine.
//!
//! - **schema**: idempotent table creation
//! - **models**: row types mirroring the tables
//! - **repositories**: query functions per table family
//! - **store**: [`PgStore`], the [`BookingStore`](salonsync_core::store::BookingStore)
//!   implementation the server runs against
//! - **mock**: a mockall double of the store for engine tests

pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

pub mod mock;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub use store::PgStore;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
