use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use schedlite_core::models::booking::{Booking, BookingWithSlot, CreateBookingRequest};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// Public booking endpoint.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn book(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(request) = payload?;
    let booking = state.bookings.book(request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings on the caller's slots. Confirmed bookings whose slot has ended
/// are expired before the list is returned.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn my_bookings(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<BookingWithSlot>>, AppError> {
    Ok(Json(state.bookings.list_mine(user_id, Utc::now()).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.cancel(booking_id, user_id).await?))
}
