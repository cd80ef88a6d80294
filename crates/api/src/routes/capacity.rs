use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/salons/:salon_id/capacity",
            get(handlers::capacity::get_capacity)
                .post(handlers::capacity::onboard_salon)
                .put(handlers::capacity::update_capacity),
        )
        .route(
            "/api/salons/:salon_id/capacity/blocks",
            post(handlers::capacity::add_block).delete(handlers::capacity::remove_block),
        )
        .route(
            "/api/salons/:salon_id/capacity/emergency",
            put(handlers::capacity::set_emergency),
        )
}
