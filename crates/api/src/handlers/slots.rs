use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use schedlite_core::{
    materializer::MaterializeReport,
    models::{
        availability::BulkAvailabilityRequest,
        slot::{CalendarSlot, CreateSlotRequest, SlotWithBooking},
    },
    schedule::ScheduleSaved,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::MessageResponse;
use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub user_id: Option<Uuid>,
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn generate_slots(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MaterializeReport>, AppError> {
    let report = state.schedules.generate_slots(user_id, Utc::now()).await?;
    Ok(Json(report))
}

/// Replaces rules and overrides in one go.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn bulk_availability(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BulkAvailabilityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduleSaved>), AppError> {
    let Json(request) = payload?;
    let saved = state
        .schedules
        .save_bulk(user_id, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_slot(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateSlotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CalendarSlot>), AppError> {
    let Json(request) = payload?;
    let slot = state.bookings.create_manual_slot(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Public: open slots that have not started yet, optionally for one user.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn available_slots(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<AvailableSlotsQuery>, QueryRejection>,
) -> Result<Json<Vec<CalendarSlot>>, AppError> {
    let Query(query) = query?;
    let slots = state
        .bookings
        .available_slots(query.user_id, Utc::now())
        .await?;
    Ok(Json(slots))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn my_slots(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SlotWithBooking>>, AppError> {
    Ok(Json(state.bookings.my_slots(user_id).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.bookings.delete_slot(slot_id, user_id).await?;
    Ok(Json(MessageResponse::new("Slot deleted.")))
}
