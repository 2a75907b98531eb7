//! [`SchedulingStore`] backed by PostgreSQL.
//!
//! Multi-step operations run in a single transaction. Overlap and
//! double-booking races are settled by the database: the slot exclusion
//! constraint, the unique `bookings.slot_id` and a compare-and-set on
//! `is_booked`.
//!
//! Cancelling moves the booking onto an archived copy of its slot so the
//! live slot can be booked again or reclaimed by the materializer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::WrapErr;
use schedlite_core::errors::{SchedError, SchedResult};
use schedlite_core::materializer::reconcile;
use schedlite_core::models::{
    availability::{
        AvailabilityOverride, AvailabilityRule, NewAvailabilityOverride, NewAvailabilityRule,
    },
    booking::{Booking, BookingWithSlot, NewBooking},
    session_type::{NewSessionType, SessionType},
    slot::{CalendarSlot, SlotRange, SlotSwap, SlotWithBooking},
};
use schedlite_core::store::SchedulingStore;
use sqlx::pool::PoolConnection;
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{availability_override, booking, rule, session_type, slot};

const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn violation_code(report: &eyre::Report) -> Option<String> {
    report
        .downcast_ref::<sqlx::Error>()
        .and_then(|err| match err {
            sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
            _ => None,
        })
}

/// Maps constraint violations to `Conflict` and everything else to `Database`.
fn classify(report: eyre::Report, conflict: &str) -> SchedError {
    let constraint_hit = violation_code(&report).is_some_and(|code| {
        matches!(
            code.as_str(),
            EXCLUSION_VIOLATION | UNIQUE_VIOLATION | FOREIGN_KEY_VIOLATION
        )
    });

    if constraint_hit {
        debug!("Constraint violation mapped to conflict: {:?}", report);
        SchedError::conflict(conflict)
    } else {
        SchedError::Database(report)
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> SchedResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .wrap_err("Failed to acquire database connection")
            .map_err(SchedError::Database)
    }

    async fn begin(&self) -> SchedResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .wrap_err("Failed to begin transaction")
            .map_err(SchedError::Database)
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> SchedResult<()> {
    tx.commit()
        .await
        .wrap_err("Failed to commit transaction")
        .map_err(SchedError::Database)
}

#[async_trait]
impl SchedulingStore for PgStore {
    async fn known_user_ids(&self) -> SchedResult<Vec<Uuid>> {
        let mut conn = self.conn().await?;
        Ok(rule::get_known_user_ids(&mut conn).await?)
    }

    async fn rules_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityRule>> {
        let mut conn = self.conn().await?;
        rule::get_rules_by_user_id(&mut conn, user_id)
            .await?
            .into_iter()
            .map(AvailabilityRule::try_from)
            .collect()
    }

    async fn overrides_for_user(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityOverride>> {
        let mut conn = self.conn().await?;
        let overrides = availability_override::get_overrides_by_user_id(&mut conn, user_id).await?;
        Ok(overrides.into_iter().map(Into::into).collect())
    }

    async fn replace_schedule(
        &self,
        user_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
        overrides: Option<Vec<NewAvailabilityOverride>>,
    ) -> SchedResult<()> {
        let mut tx = self.begin().await?;

        rule::delete_rules_by_user_id(&mut tx, user_id).await?;
        for entry in &rules {
            rule::create_rule(
                &mut tx,
                user_id,
                i16::from(entry.day_of_week),
                entry.start_time.as_naive(),
                entry.end_time.as_naive(),
                entry.session_type_id,
            )
            .await
            .map_err(|e| classify(e, "Rule references an unknown session type."))?;
        }

        if let Some(overrides) = overrides {
            availability_override::delete_overrides_by_user_id(&mut tx, user_id).await?;
            for entry in &overrides {
                availability_override::create_override(
                    &mut tx,
                    user_id,
                    entry.date,
                    entry.status.as_str(),
                    entry.start_time.map(|t| t.as_naive()),
                    entry.end_time.map(|t| t.as_naive()),
                )
                .await
                .map_err(|e| classify(e, "Duplicate override date."))?;
            }
        }

        commit(tx).await
    }

    async fn upsert_override(
        &self,
        user_id: Uuid,
        entry: NewAvailabilityOverride,
    ) -> SchedResult<AvailabilityOverride> {
        let mut conn = self.conn().await?;
        let saved = availability_override::upsert_override(
            &mut conn,
            user_id,
            entry.date,
            entry.status.as_str(),
            entry.start_time.map(|t| t.as_naive()),
            entry.end_time.map(|t| t.as_naive()),
        )
        .await?;
        Ok(saved.into())
    }

    async fn swap_future_slots(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        candidates: Vec<SlotRange>,
    ) -> SchedResult<SlotSwap> {
        let mut tx = self.begin().await?;
        slot::lock_user_slots(&mut tx, user_id).await?;

        let removed = slot::delete_reclaimable_slots(&mut tx, user_id, now).await?;
        let kept: Vec<SlotRange> = slot::get_unfinished_slots_by_user_id(&mut tx, user_id, now)
            .await?
            .into_iter()
            .map(|row| CalendarSlot::from(row).range())
            .collect();

        let (accepted, skipped) = reconcile(candidates, &kept);
        let inserted = accepted.len() as u64;
        for range in accepted {
            slot::create_slot(&mut tx, user_id, range.start, range.end)
                .await
                .map_err(|e| classify(e, "Generated slot overlaps an existing one."))?;
        }

        commit(tx).await?;
        Ok(SlotSwap {
            removed,
            inserted,
            skipped: skipped as u64,
        })
    }

    async fn insert_slot(&self, user_id: Uuid, range: SlotRange) -> SchedResult<CalendarSlot> {
        let mut conn = self.conn().await?;
        let created = slot::create_slot(&mut conn, user_id, range.start, range.end)
            .await
            .map_err(|e| classify(e, "Slot overlaps with an existing one."))?;
        Ok(created.into())
    }

    async fn slot_by_id(&self, slot_id: Uuid) -> SchedResult<Option<CalendarSlot>> {
        let mut conn = self.conn().await?;
        Ok(slot::get_slot_by_id(&mut conn, slot_id).await?.map(Into::into))
    }

    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> SchedResult<bool> {
        let mut conn = self.conn().await?;
        Ok(slot::delete_unbooked_slot(&mut conn, slot_id).await?)
    }

    async fn available_slots(
        &self,
        user_id: Option<Uuid>,
        from: DateTime<Utc>,
    ) -> SchedResult<Vec<CalendarSlot>> {
        let mut conn = self.conn().await?;
        let slots = slot::get_available_slots(&mut conn, user_id, from).await?;
        Ok(slots.into_iter().map(Into::into).collect())
    }

    async fn slots_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SlotWithBooking>> {
        let mut conn = self.conn().await?;
        slot::get_slots_with_bookings_by_user_id(&mut conn, user_id)
            .await?
            .into_iter()
            .map(|row| {
                let booking = row.booking()?;
                Ok(SlotWithBooking {
                    slot: row.slot.into(),
                    booking,
                })
            })
            .collect()
    }

    async fn insert_booking(&self, new_booking: NewBooking) -> SchedResult<Booking> {
        let mut tx = self.begin().await?;

        if !slot::mark_slot_booked(&mut tx, new_booking.slot_id).await? {
            return match slot::get_slot_by_id(&mut tx, new_booking.slot_id).await? {
                Some(_) => Err(SchedError::conflict("Slot is already booked.")),
                None => Err(SchedError::not_found("Slot not found.")),
            };
        }

        let saved = booking::create_booking(
            &mut tx,
            new_booking.slot_id,
            new_booking.session_type_id,
            &new_booking.name,
            &new_booking.email,
            new_booking.note.as_deref(),
        )
        .await
        .map_err(|e| match violation_code(&e).as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => SchedError::conflict("Session type no longer exists."),
            _ => classify(e, "Slot is already booked."),
        })?;

        commit(tx).await?;
        saved.try_into()
    }

    async fn booking_by_id(&self, booking_id: Uuid) -> SchedResult<Option<BookingWithSlot>> {
        let mut conn = self.conn().await?;
        booking::get_booking_by_id(&mut conn, booking_id)
            .await?
            .map(BookingWithSlot::try_from)
            .transpose()
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> SchedResult<Option<Booking>> {
        let mut tx = self.begin().await?;

        let Some(cancelled) = booking::cancel_booking(&mut tx, booking_id).await? else {
            return Ok(None);
        };
        let live_slot_id = cancelled.slot_id;
        let archived_id = slot::create_archived_copy(&mut tx, live_slot_id).await?;
        let moved = booking::move_booking_to_slot(&mut tx, cancelled.id, archived_id).await?;
        slot::release_slot(&mut tx, live_slot_id).await?;

        commit(tx).await?;
        debug!(
            "Booking {} archived on slot {}, slot {} reopened",
            moved.id, archived_id, live_slot_id
        );
        Ok(Some(moved.try_into()?))
    }

    async fn expire_bookings(&self, user_id: Uuid, now: DateTime<Utc>) -> SchedResult<u64> {
        let mut conn = self.conn().await?;
        Ok(booking::expire_bookings(&mut conn, user_id, now).await?)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> SchedResult<Vec<BookingWithSlot>> {
        let mut conn = self.conn().await?;
        booking::get_bookings_by_user_id(&mut conn, user_id)
            .await?
            .into_iter()
            .map(BookingWithSlot::try_from)
            .collect()
    }

    async fn session_types_for_user(&self, user_id: Uuid) -> SchedResult<Vec<SessionType>> {
        let mut conn = self.conn().await?;
        let types = session_type::get_session_types_by_user_id(&mut conn, user_id).await?;
        Ok(types.into_iter().map(Into::into).collect())
    }

    async fn session_type_by_id(&self, session_type_id: Uuid) -> SchedResult<Option<SessionType>> {
        let mut conn = self.conn().await?;
        Ok(session_type::get_session_type_by_id(&mut conn, session_type_id)
            .await?
            .map(Into::into))
    }

    async fn insert_session_type(
        &self,
        user_id: Uuid,
        new_type: NewSessionType,
    ) -> SchedResult<SessionType> {
        let mut conn = self.conn().await?;
        let saved = session_type::create_session_type(
            &mut conn,
            user_id,
            &new_type.name,
            new_type.duration_minutes,
            new_type.price_cents,
        )
        .await?;
        Ok(saved.into())
    }

    async fn delete_session_type(&self, session_type_id: Uuid) -> SchedResult<()> {
        let mut conn = self.conn().await?;
        session_type::delete_session_type(&mut conn, session_type_id)
            .await
            .map_err(|e| classify(e, "Session type is still in use."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_database_errors() {
        let err = classify(eyre::eyre!("connection reset"), "unused");
        assert!(matches!(err, SchedError::Database(_)));

        let err = classify(sqlx::Error::RowNotFound.into(), "unused");
        assert!(matches!(err, SchedError::Database(_)));
        assert_eq!(violation_code(&sqlx::Error::RowNotFound.into()), None);
    }
}
