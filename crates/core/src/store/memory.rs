//! In-memory [`SchedulingStore`], used by tests and local development.
//!
//! All state sits behind one mutex, so each trait call is trivially atomic
//! and concurrent callers are serialized.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::SchedulingStore;
use crate::errors::{SchedError, SchedResult};
use crate::materializer::reconcile;
use crate::models::{
    availability::{
        AvailabilityOverride, AvailabilityRule, NewAvailabilityOverride, NewAvailabilityRule,
    },
    booking::{Booking, BookingStatus, BookingWithSlot, NewBooking},
    session_type::{NewSessionType, SessionType},
    slot::{CalendarSlot, SlotRange, SlotSwap, SlotWithBooking},
};

#[derive(Debug, Default)]
struct MemoryState {
    rules: Vec<AvailabilityRule>,
    overrides: Vec<AvailabilityOverride>,
    slots: Vec<CalendarSlot>,
    bookings: Vec<Booking>,
    session_types: Vec<SessionType>,
}

impl MemoryState {
    fn slot(&self, slot_id: Uuid) -> Option<&CalendarSlot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    fn has_booking(&self, slot_id: Uuid) -> bool {
        self.bookings.iter().any(|b| b.slot_id == slot_id)
    }

    fn with_slot(&self, booking: &Booking) -> SchedResult<BookingWithSlot> {
        let slot = self.slot(booking.slot_id).cloned().ok_or_else(|| {
            SchedError::Database(eyre::eyre!("Booking {} has no slot", booking.id))
        })?;
        Ok(BookingWithSlot {
            booking: booking.clone(),
            slot,
        })
    }

    fn push_slot(&mut self, user_id: Uuid, range: SlotRange) -> CalendarSlot {
        let slot = CalendarSlot {
            id: Uuid::new_v4(),
            user_id,
            start_time: range.start,
            end_time: range.end,
            is_booked: false,
            is_archived: false,
            created_at: Utc::now(),
        };
        self.slots.push(slot.clone());
        slot
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn known_user_ids(&self) -> SchedResult<Vec<Uuid>> {
        let state = self.state.lock().await;
        let mut seen = HashSet::new();
        let ids = state
            .rules
            .iter()
            .map(|r| r.user_id)
            .chain(state.overrides.iter().map(|o| o.user_id))
            .filter(|id| seen.insert(*id))
            .collect();
        Ok(ids)
    }

    async fn rules_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityRule>> {
        let state = self.state.lock().await;
        let mut rules: Vec<_> = state
            .rules
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn overrides_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityOverride>> {
        let state = self.state.lock().await;
        let mut overrides: Vec<_> = state
            .overrides
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        overrides.sort_by_key(|o| (o.date, o.created_at));
        Ok(overrides)
    }

    async fn replace_schedule(
        &self,
        user_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
        overrides: Option<Vec<NewAvailabilityOverride>>,
    ) -> SchedResult<()> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        for rule in &rules {
            if let Some(id) = rule.session_type_id {
                if !state.session_types.iter().any(|t| t.id == id) {
                    return Err(SchedError::conflict(format!(
                        "Session type {} does not exist",
                        id
                    )));
                }
            }
        }
        if let Some(overrides) = &overrides {
            let mut dates = HashSet::new();
            if !overrides.iter().all(|o| dates.insert(o.date)) {
                return Err(SchedError::conflict("Duplicate override date"));
            }
        }

        state.rules.retain(|r| r.user_id != user_id);
        state
            .rules
            .extend(rules.into_iter().map(|rule| AvailabilityRule {
                id: Uuid::new_v4(),
                user_id,
                day_of_week: rule.day_of_week,
                start_time: rule.start_time,
                end_time: rule.end_time,
                session_type_id: rule.session_type_id,
                created_at: now,
            }));

        if let Some(overrides) = overrides {
            state.overrides.retain(|o| o.user_id != user_id);
            state
                .overrides
                .extend(overrides.into_iter().map(|o| AvailabilityOverride {
                    id: Uuid::new_v4(),
                    user_id,
                    date: o.date,
                    status: o.status,
                    start_time: o.start_time,
                    end_time: o.end_time,
                    created_at: now,
                }));
        }

        Ok(())
    }

    async fn upsert_override(
        &self,
        user_id: Uuid,
        entry: NewAvailabilityOverride,
    ) -> SchedResult<AvailabilityOverride> {
        let mut state = self.state.lock().await;
        state
            .overrides
            .retain(|o| !(o.user_id == user_id && o.date == entry.date));

        let saved = AvailabilityOverride {
            id: Uuid::new_v4(),
            user_id,
            date: entry.date,
            status: entry.status,
            start_time: entry.start_time,
            end_time: entry.end_time,
            created_at: Utc::now(),
        };
        state.overrides.push(saved.clone());
        Ok(saved)
    }

    async fn swap_future_slots(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        candidates: Vec<SlotRange>,
    ) -> SchedResult<SlotSwap> {
        let mut state = self.state.lock().await;

        let reclaimable: HashSet<Uuid> = state
            .slots
            .iter()
            .filter(|s| {
                s.user_id == user_id
                    && s.start_time >= now
                    && s.is_open()
                    && !state.has_booking(s.id)
            })
            .map(|s| s.id)
            .collect();
        state.slots.retain(|s| !reclaimable.contains(&s.id));

        let kept: Vec<SlotRange> = state
            .slots
            .iter()
            .filter(|s| s.user_id == user_id && !s.is_archived && s.end_time > now)
            .map(CalendarSlot::range)
            .collect();
        let (accepted, skipped) = reconcile(candidates, &kept);

        let inserted = accepted.len() as u64;
        for range in accepted {
            state.push_slot(user_id, range);
        }

        Ok(SlotSwap {
            removed: reclaimable.len() as u64,
            inserted,
            skipped: skipped as u64,
        })
    }

    async fn insert_slot(&self, user_id: Uuid, range: SlotRange) -> SchedResult<CalendarSlot> {
        let mut state = self.state.lock().await;
        let overlapping = state
            .slots
            .iter()
            .any(|s| s.user_id == user_id && !s.is_archived && s.range().overlaps(&range));
        if overlapping {
            return Err(SchedError::conflict("Slot overlaps with an existing one."));
        }
        Ok(state.push_slot(user_id, range))
    }

    async fn slot_by_id(&self, slot_id: Uuid) -> SchedResult<Option<CalendarSlot>> {
        let state = self.state.lock().await;
        Ok(state.slot(slot_id).cloned())
    }

    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> SchedResult<bool> {
        let mut state = self.state.lock().await;
        if state.has_booking(slot_id) {
            return Ok(false);
        }
        let before = state.slots.len();
        state.slots.retain(|s| s.id != slot_id || !s.is_open());
        Ok(state.slots.len() < before)
    }

    async fn available_slots(
        &self,
        user_id: Option<Uuid>,
        from: DateTime<Utc>,
    ) -> SchedResult<Vec<CalendarSlot>> {
        let state = self.state.lock().await;
        let mut slots: Vec<_> = state
            .slots
            .iter()
            .filter(|s| s.is_open() && s.start_time >= from)
            .filter(|s| user_id.is_none_or(|id| s.user_id == id))
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn slots_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SlotWithBooking>> {
        let state = self.state.lock().await;
        let mut slots: Vec<_> = state
            .slots
            .iter()
            .filter(|s| s.user_id == user_id && !s.is_archived)
            .map(|slot| SlotWithBooking {
                slot: slot.clone(),
                booking: state
                    .bookings
                    .iter()
                    .find(|b| b.slot_id == slot.id)
                    .cloned(),
            })
            .collect();
        slots.sort_by(|a, b| b.slot.start_time.cmp(&a.slot.start_time));
        Ok(slots)
    }

    async fn insert_booking(&self, booking: NewBooking) -> SchedResult<Booking> {
        let mut state = self.state.lock().await;
        let taken = state.has_booking(booking.slot_id);
        let slot = state
            .slots
            .iter_mut()
            .find(|s| s.id == booking.slot_id)
            .ok_or_else(|| SchedError::not_found("Slot not found."))?;
        if !slot.is_open() || taken {
            return Err(SchedError::conflict("Slot is already booked."));
        }
        slot.is_booked = true;

        let saved = Booking {
            id: Uuid::new_v4(),
            slot_id: booking.slot_id,
            session_type_id: booking.session_type_id,
            name: booking.name,
            email: booking.email,
            note: booking.note,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        state.bookings.push(saved.clone());
        Ok(saved)
    }

    async fn booking_by_id(&self, booking_id: Uuid) -> SchedResult<Option<BookingWithSlot>> {
        let state = self.state.lock().await;
        state
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .map(|b| state.with_slot(b))
            .transpose()
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> SchedResult<Option<Booking>> {
        let mut state = self.state.lock().await;
        let Some(booking_idx) = state
            .bookings
            .iter()
            .position(|b| b.id == booking_id && b.status == BookingStatus::Confirmed)
        else {
            return Ok(None);
        };
        let live_slot_id = state.bookings[booking_idx].slot_id;
        let slot_idx = state
            .slots
            .iter()
            .position(|s| s.id == live_slot_id)
            .ok_or_else(|| {
                SchedError::Database(eyre::eyre!("Booking {} has no slot", booking_id))
            })?;

        let archived = CalendarSlot {
            id: Uuid::new_v4(),
            is_booked: false,
            is_archived: true,
            ..state.slots[slot_idx].clone()
        };
        let archived_id = archived.id;
        state.slots.push(archived);
        state.slots[slot_idx].is_booked = false;

        let booking = &mut state.bookings[booking_idx];
        booking.status = BookingStatus::Cancelled;
        booking.slot_id = archived_id;
        Ok(Some(booking.clone()))
    }

    async fn expire_bookings(&self, user_id: Uuid, now: DateTime<Utc>) -> SchedResult<u64> {
        let mut state = self.state.lock().await;
        let ended: HashSet<Uuid> = state
            .slots
            .iter()
            .filter(|s| s.user_id == user_id && s.end_time < now)
            .map(|s| s.id)
            .collect();

        let mut changed = 0;
        for booking in state
            .bookings
            .iter_mut()
            .filter(|b| b.status == BookingStatus::Confirmed && ended.contains(&b.slot_id))
        {
            booking.status = BookingStatus::Expired;
            changed += 1;
        }
        Ok(changed)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> SchedResult<Vec<BookingWithSlot>> {
        let state = self.state.lock().await;
        let mut bookings = state
            .bookings
            .iter()
            .filter(|b| state.slot(b.slot_id).is_some_and(|s| s.user_id == user_id))
            .map(|b| state.with_slot(b))
            .collect::<SchedResult<Vec<_>>>()?;
        bookings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(bookings)
    }

    async fn session_types_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SessionType>> {
        let state = self.state.lock().await;
        let mut types: Vec<_> = state
            .session_types
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        types.sort_by_key(|t| t.created_at);
        Ok(types)
    }

    async fn session_type_by_id(&self, session_type_id: Uuid) -> SchedResult<Option<SessionType>> {
        let state = self.state.lock().await;
        Ok(state
            .session_types
            .iter()
            .find(|t| t.id == session_type_id)
            .cloned())
    }

    async fn insert_session_type(
        &self,
        user_id: Uuid,
        session_type: NewSessionType,
    ) -> SchedResult<SessionType> {
        let mut state = self.state.lock().await;
        let saved = SessionType {
            id: Uuid::new_v4(),
            user_id,
            name: session_type.name,
            duration_minutes: session_type.duration_minutes,
            price_cents: session_type.price_cents,
            created_at: Utc::now(),
        };
        state.session_types.push(saved.clone());
        Ok(saved)
    }

    async fn delete_session_type(&self, session_type_id: Uuid) -> SchedResult<()> {
        let mut state = self.state.lock().await;
        let referenced = state
            .rules
            .iter()
            .any(|r| r.session_type_id == Some(session_type_id))
            || state
                .bookings
                .iter()
                .any(|b| b.session_type_id == session_type_id);
        if referenced {
            return Err(SchedError::conflict("Session type is still in use."));
        }
        state.session_types.retain(|t| t.id != session_type_id);
        Ok(())
    }
}
