use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/salons/:salon_id/braiders",
            get(handlers::braider::list_braiders).post(handlers::braider::register_braider),
        )
        .route(
            "/api/salons/:salon_id/braiders/available",
            get(handlers::braider::available_braiders),
        )
        .route("/api/braiders/:id", put(handlers::braider::update_braider))
        .route(
            "/api/braiders/:id/deactivate",
            post(handlers::braider::deactivate_braider),
        )
        .route("/api/braiders/:id/time-off", post(handlers::braider::add_time_off))
        .route("/api/braiders/:id/schedule", get(handlers::braider::braider_schedule))
}
