use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/book", post(handlers::bookings::book))
        .route("/api/book/mine", get(handlers::bookings::my_bookings))
        .route(
            "/api/book/:id/cancel",
            patch(handlers::bookings::cancel_booking),
        )
}
