use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/slots", post(handlers::slots::create_slot))
        .route("/api/slots/generate", post(handlers::slots::generate_slots))
        .route("/api/slots/bulk", post(handlers::slots::bulk_availability))
        .route("/api/slots/available", get(handlers::slots::available_slots))
        .route("/api/slots/mine", get(handlers::slots::my_slots))
        .route("/api/slots/:id", delete(handlers::slots::delete_slot))
}
