//! # API Configuration Module
//!
//! This module handles loading configuration for the SalonSync API server and
//! the booking engine it hosts. Values come from environment variables, with
//! defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
//! - `BOOKING_LOCK_TIMEOUT_MS`: Longest wait for a day lock (default: 5000)
//! - `BOOKING_AUTO_CONFIRM`: Create bookings as confirmed (default: false)
//! - `BOOKING_UNASSIGNED_POLICY`: `accept` or `reject` bookings no braider can
//!   take (default: accept)

use std::env;
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};
use salonsync_core::engine::{DEFAULT_LOCK_TIMEOUT, EngineSettings, UnassignedPolicy};
use tracing::Level;

/// Configuration for the SalonSync API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use salonsync_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}:{}", config.host, config.port);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub lock_timeout_ms: u64,
    pub auto_confirm: bool,
    pub unassigned_policy: String,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DATABASE_URL environment variable is not set
    /// - The API_PORT value cannot be parsed as a u16
    /// - BOOKING_LOCK_TIMEOUT_MS or BOOKING_AUTO_CONFIRM is malformed
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = parse_log_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Engine settings
        let lock_timeout_ms = match env::var("BOOKING_LOCK_TIMEOUT_MS") {
            Ok(value) => value.parse().wrap_err("Invalid BOOKING_LOCK_TIMEOUT_MS value")?,
            Err(_) => DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        };
        let auto_confirm = match env::var("BOOKING_AUTO_CONFIRM") {
            Ok(value) => value.parse().wrap_err("Invalid BOOKING_AUTO_CONFIRM value")?,
            Err(_) => false,
        };
        let unassigned_policy =
            env::var("BOOKING_UNASSIGNED_POLICY").unwrap_or_else(|_| "accept".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            lock_timeout_ms,
            auto_confirm,
            unassigned_policy,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let unassigned_policy: UnassignedPolicy = self
            .unassigned_policy
            .parse()
            .map_err(|e| eyre!("Invalid BOOKING_UNASSIGNED_POLICY value: {}", e))?;

        Ok(EngineSettings {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            auto_confirm: self.auto_confirm,
            unassigned_policy,
        })
    }
}

pub fn parse_log_level(value: &str) -> Level {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
