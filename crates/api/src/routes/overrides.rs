use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/overrides",
        get(handlers::rules::get_overrides).post(handlers::rules::add_override),
    )
}
