use color_eyre::eyre::Result;
use dotenv::dotenv;
use salonsync_api::config::ApiConfig;
use salonsync_db::{create_pool, schema::initialize_database};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration; engine settings are checked before touching the database
    let config = ApiConfig::from_env()?;
    config.engine_settings()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Start API server
    salonsync_api::start_server(config, db_pool).await?;

    Ok(())
}
