//! # SalonSync API
//!
//! The API crate provides the web server for the SalonSync booking engine.
//! It exposes capacity settings, availability, braider management and the
//! booking lifecycle as JSON endpoints.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into engine operations
//! - **Middleware**: Error mapping from domain errors to HTTP responses
//! - **Config**: Handle environment and application configuration
//!
//! All decisions are made by [`BookingEngine`]; handlers never touch storage
//! directly.

/// Configuration module for API settings
pub mod config;
/// Request handlers that call into the booking engine
pub mod handlers;
/// Error handling shared by all handlers
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use eyre::Result;
use salonsync_core::BookingEngine;
use salonsync_db::{DbPool, PgStore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
///
/// The engine owns the store and the per-day locks, so one instance must be
/// shared by every request for the locks to mean anything.
pub struct ApiState {
    pub engine: BookingEngine,
}

/// Builds the application router with all routes attached to `state`.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Capacity settings, blocks and emergency overrides
        .merge(routes::capacity::routes())
        // Slot availability and advisory capacity checks
        .merge(routes::availability::routes())
        // Braider registry and schedules
        .merge(routes::braider::routes())
        // Booking creation and lifecycle
        .merge(routes::booking::routes())
        .with_state(state)
}

/// Starts the API server over PostgreSQL
///
/// Installs the tracing subscriber, builds the engine from the configuration
/// and serves until the listener fails.
pub async fn start_server(config: config::ApiConfig, db_pool: DbPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = Arc::new(PgStore::new(db_pool));
    let engine = BookingEngine::new(store, config.engine_settings()?);
    let state = Arc::new(ApiState { engine });

    let app = router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_origin(allowed);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(axum::error_handling::HandleErrorLayer::new(
                middleware::error_handling::handle_timeout,
            ))
            .timeout(std::time::Duration::from_secs(config.request_timeout))
            .into_inner(),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
