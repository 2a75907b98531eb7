use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
};
use schedlite_core::models::session_type::{CreateSessionTypeRequest, SessionType};
use std::sync::Arc;
use uuid::Uuid;

use super::MessageResponse;
use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn list_session_types(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SessionType>>, AppError> {
    Ok(Json(state.schedules.session_types(user_id).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_session_type(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateSessionTypeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionType>), AppError> {
    let Json(request) = payload?;
    let created = state
        .schedules
        .create_session_type(user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn delete_session_type(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(session_type_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .schedules
        .delete_session_type(session_type_id, user_id)
        .await?;
    Ok(Json(MessageResponse::new("Session type deleted.")))
}
