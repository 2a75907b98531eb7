use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use chrono::Utc;
use schedlite_core::{
    models::availability::{AvailabilityOverride, AvailabilityRule, OverrideInput, SaveRulesRequest},
    schedule::ScheduleSaved,
};
use std::sync::Arc;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// Replaces the caller's weekly rules and regenerates their slots.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn save_rules(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<SaveRulesRequest>, JsonRejection>,
) -> Result<Json<ScheduleSaved>, AppError> {
    let Json(request) = payload?;
    let saved = state
        .schedules
        .save_rules(user_id, request, Utc::now())
        .await?;
    Ok(Json(saved))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_rules(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<AvailabilityRule>>, AppError> {
    Ok(Json(state.schedules.rules(user_id).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_overrides(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<AvailabilityOverride>>, AppError> {
    Ok(Json(state.schedules.overrides(user_id).await?))
}

/// Sets the override for one date, replacing any previous one for that date.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn add_override(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<OverrideInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AvailabilityOverride>), AppError> {
    let Json(input) = payload?;
    let saved = state
        .schedules
        .add_override(user_id, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
