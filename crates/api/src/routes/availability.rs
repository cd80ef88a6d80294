use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/salons/:salon_id/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/salons/:salon_id/capacity/check",
            get(handlers::availability::check_capacity),
        )
}
