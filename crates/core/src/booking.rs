//! Booking state machine and manual slot management.
//!
//! A booking moves `confirmed -> cancelled` or `confirmed -> expired`; both end
//! states are terminal. Cancelling frees the slot again, expiry does not.
//!
//! Every slot carries at most one booking. On cancel the booking moves to an
//! archived copy of its slot, and the original slot goes back to being open.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{SchedError, SchedResult};
use crate::models::{
    booking::{Booking, BookingWithSlot, CreateBookingRequest, NewBooking},
    slot::{CalendarSlot, CreateSlotRequest, SlotRange, SlotWithBooking},
};
use crate::store::SchedulingStore;

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_timestamp(field: &str, value: Option<&str>) -> SchedResult<DateTime<Utc>> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SchedError::validation("Start and end time are required."))?;
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| SchedError::validation(format!("Invalid {}: '{}'", field, value)))
}

pub struct BookingEngine {
    store: Arc<dyn SchedulingStore>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Books a slot for an external client.
    ///
    /// # Errors
    ///
    /// * `Validation` - missing fields, malformed email, unknown session type,
    ///   or a slot that has already started
    /// * `NotFound` - the slot does not exist
    /// * `Conflict` - the slot is already booked, including when a concurrent
    ///   request won the race
    pub async fn book(
        &self,
        request: CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> SchedResult<Booking> {
        let (Some(slot_id), Some(session_type_id), Some(name), Some(email)) = (
            request.slot_id,
            request.session_type_id,
            required(request.name),
            required(request.email),
        ) else {
            return Err(SchedError::validation(
                "slotId, name, email, and sessionTypeId are required.",
            ));
        };

        if !validator::validate_email(email.as_str()) {
            return Err(SchedError::validation("Invalid email format."));
        }

        let slot = self
            .store
            .slot_by_id(slot_id)
            .await?
            .ok_or_else(|| SchedError::not_found("Slot not found."))?;

        if slot.start_time < now {
            return Err(SchedError::validation("Cannot book a slot in the past."));
        }
        if slot.is_booked {
            return Err(SchedError::conflict("Slot is already booked."));
        }
        if slot.is_archived {
            return Err(SchedError::conflict("Slot is no longer available."));
        }

        let owned_session_type = self
            .store
            .session_type_by_id(session_type_id)
            .await?
            .is_some_and(|t| t.user_id == slot.user_id);
        if !owned_session_type {
            return Err(SchedError::validation(
                "Session type is not offered by this slot's owner.",
            ));
        }

        // The store re-checks `is_booked` atomically; losing a race ends here as Conflict.
        let booking = self
            .store
            .insert_booking(NewBooking {
                slot_id,
                session_type_id,
                name,
                email,
                note: required(request.note),
            })
            .await?;

        info!("Booked slot {} as booking {}", slot_id, booking.id);
        Ok(booking)
    }

    /// Cancels a confirmed booking on one of the caller's slots.
    pub async fn cancel(&self, booking_id: Uuid, requesting_user_id: Uuid) -> SchedResult<Booking> {
        let existing = self
            .store
            .booking_by_id(booking_id)
            .await?
            .ok_or_else(|| SchedError::not_found("Booking not found."))?;

        if existing.slot.user_id != requesting_user_id {
            return Err(SchedError::Authorization(
                "You are not authorized to cancel this booking.".to_string(),
            ));
        }

        let cancelled = self
            .store
            .cancel_booking(booking_id)
            .await?
            .ok_or_else(|| {
                SchedError::conflict(format!(
                    "Booking is already {} and cannot be cancelled.",
                    existing.booking.status
                ))
            })?;

        info!("Cancelled booking {} on slot {}", booking_id, existing.slot.id);
        Ok(cancelled)
    }

    /// Lists bookings on the user's slots, newest first, after expiring any
    /// confirmed booking whose slot has already ended.
    pub async fn list_mine(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> SchedResult<Vec<BookingWithSlot>> {
        let expired = self.store.expire_bookings(user_id, now).await?;
        if expired > 0 {
            debug!("Expired {} bookings for user {}", expired, user_id);
        }
        self.store.bookings_for_user(user_id).await
    }

    /// Creates a single slot by hand. Overlap with any existing slot of the
    /// user is a `Conflict`, enforced by the store.
    pub async fn create_manual_slot(
        &self,
        user_id: Uuid,
        request: CreateSlotRequest,
    ) -> SchedResult<CalendarSlot> {
        let start = parse_timestamp("startTime", request.start_time.as_deref())?;
        let end = parse_timestamp("endTime", request.end_time.as_deref())?;
        let range = SlotRange::new(start, end)
            .ok_or_else(|| SchedError::validation("Start time must be before end time."))?;

        self.store.insert_slot(user_id, range).await
    }

    pub async fn delete_slot(&self, slot_id: Uuid, requesting_user_id: Uuid) -> SchedResult<()> {
        let slot = self
            .store
            .slot_by_id(slot_id)
            .await?
            .ok_or_else(|| SchedError::not_found("Slot not found."))?;

        if slot.user_id != requesting_user_id {
            return Err(SchedError::Authorization("You do not own this slot.".to_string()));
        }
        if slot.is_booked {
            return Err(SchedError::validation("Cannot delete a slot that is already booked."));
        }
        if slot.is_archived {
            return Err(SchedError::validation(
                "Cannot delete a slot that holds booking history.",
            ));
        }

        // Conditional delete: a booking committed since the read keeps the slot.
        if !self.store.delete_unbooked_slot(slot_id).await? {
            return Err(SchedError::validation("Cannot delete a slot that is already booked."));
        }
        Ok(())
    }

    pub async fn available_slots(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> SchedResult<Vec<CalendarSlot>> {
        self.store.available_slots(user_id, now).await
    }

    pub async fn my_slots(&self, user_id: Uuid) -> SchedResult<Vec<SlotWithBooking>> {
        self.store.slots_for_user(user_id).await
    }
}
