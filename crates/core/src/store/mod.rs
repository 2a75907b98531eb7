//! Persistence boundary for the scheduling core.
//!
//! Every multi-row mutation on this trait is atomic: implementations either
//! apply all of it or none of it. Components receive the store as an
//! `Arc<dyn SchedulingStore>` so that PostgreSQL and the in-memory store are
//! interchangeable.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::SchedResult;
use crate::models::{
    availability::{
        AvailabilityOverride, AvailabilityRule, NewAvailabilityOverride, NewAvailabilityRule,
    },
    booking::{Booking, BookingWithSlot, NewBooking},
    session_type::{NewSessionType, SessionType},
    slot::{CalendarSlot, SlotRange, SlotSwap, SlotWithBooking},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    /// Users with at least one rule or override.
    async fn known_user_ids(&self) -> SchedResult<Vec<Uuid>>;

    /// Rules ordered by day of week, then start time.
    async fn rules_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityRule>>;

    /// Overrides ordered by date, then creation time.
    async fn overrides_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityOverride>>;

    /// Replaces all of a user's rules and, when `overrides` is given, all of
    /// their overrides, in one transaction.
    async fn replace_schedule(
        &self,
        user_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
        overrides: Option<Vec<NewAvailabilityOverride>>,
    ) -> SchedResult<()>;

    /// Inserts an override, replacing any existing one for the same date.
    async fn upsert_override(
        &self,
        user_id: Uuid,
        entry: NewAvailabilityOverride,
    ) -> SchedResult<AvailabilityOverride>;

    /// Atomically swaps the user's reclaimable future slots for `candidates`.
    ///
    /// A slot is reclaimable when it starts at or after `now` and is open,
    /// i.e. it carries no active booking. Archived slots are history and are
    /// neither removed nor counted as surviving. Candidates overlapping a
    /// surviving slot, or an earlier candidate, are skipped (see
    /// [`crate::materializer::reconcile`]).
    async fn swap_future_slots(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        candidates: Vec<SlotRange>,
    ) -> SchedResult<SlotSwap>;

    /// Creates a single slot. Fails with `Conflict` when it overlaps any other
    /// live slot of the same user.
    async fn insert_slot(&self, user_id: Uuid, range: SlotRange) -> SchedResult<CalendarSlot>;

    async fn slot_by_id(&self, slot_id: Uuid) -> SchedResult<Option<CalendarSlot>>;

    /// Deletes the slot only if it is open. Returns whether a row was removed.
    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> SchedResult<bool>;

    /// Open slots starting at or after `from`, earliest first.
    async fn available_slots(
        &self,
        user_id: Option<Uuid>,
        from: DateTime<Utc>,
    ) -> SchedResult<Vec<CalendarSlot>>;

    /// Live slots of a user, latest first, each with its booking if it has one.
    async fn slots_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SlotWithBooking>>;

    /// Flips the slot to booked and records a confirmed booking in one
    /// transaction. Fails with `Conflict` when the slot is not open.
    ///
    /// A slot carries at most one booking row ever.
    async fn insert_booking(&self, booking: NewBooking) -> SchedResult<Booking>;

    async fn booking_by_id(&self, booking_id: Uuid) -> SchedResult<Option<BookingWithSlot>>;

    /// Moves a confirmed booking to cancelled and reopens its slot in one
    /// transaction. The cancelled booking is moved onto a new archived copy
    /// of the slot, so the reopened slot has no booking and can be booked or
    /// reclaimed again. Returns `None` when the booking is not confirmed.
    async fn cancel_booking(&self, booking_id: Uuid) -> SchedResult<Option<Booking>>;

    /// Marks confirmed bookings on the user's slots that ended before `now`
    /// as expired. Returns the number of bookings changed.
    async fn expire_bookings(&self, user_id: Uuid, now: DateTime<Utc>) -> SchedResult<u64>;

    /// Bookings on slots owned by the user, newest first.
    async fn bookings_for_user(&self, user_id: Uuid) -> SchedResult<Vec<BookingWithSlot>>;

    async fn session_types_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SessionType>>;

    async fn session_type_by_id(&self, session_type_id: Uuid) -> SchedResult<Option<SessionType>>;

    async fn insert_session_type(
        &self,
        user_id: Uuid,
        session_type: NewSessionType,
    ) -> SchedResult<SessionType>;

    /// Fails with `Conflict` while rules or bookings still reference it.
    async fn delete_session_type(&self, session_type_id: Uuid) -> SchedResult<()>;
}
