use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/session-types",
            get(handlers::session_types::list_session_types)
                .post(handlers::session_types::create_session_type),
        )
        .route(
            "/api/session-types/:id",
            delete(handlers::session_types::delete_session_type),
        )
}
