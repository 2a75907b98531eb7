use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/rules",
        get(handlers::rules::get_rules).post(handlers::rules::save_rules),
    )
}
