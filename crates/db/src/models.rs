use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::eyre;
use schedlite_core::errors::SchedError;
use schedlite_core::models::{
    availability::{AvailabilityOverride, AvailabilityRule, OverrideStatus},
    booking::{Booking, BookingWithSlot},
    session_type::SessionType,
    slot::CalendarSlot,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSessionType {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub session_type_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityOverride {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCalendarSlot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub session_type_id: Uuid,
    pub name: String,
    pub email: String,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A booking joined with its slot. Slot columns carry a `slot_` prefix.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingWithSlot {
    #[sqlx(flatten)]
    pub booking: DbBooking,
    pub slot_user_id: Uuid,
    pub slot_start_time: DateTime<Utc>,
    pub slot_end_time: DateTime<Utc>,
    pub slot_is_booked: bool,
    pub slot_is_archived: bool,
    pub slot_created_at: DateTime<Utc>,
}

/// A slot left-joined with its booking. Booking columns carry a
/// `booking_` prefix and are all null when the slot was never booked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlotWithBooking {
    #[sqlx(flatten)]
    pub slot: DbCalendarSlot,
    pub booking_id: Option<Uuid>,
    pub booking_session_type_id: Option<Uuid>,
    pub booking_name: Option<String>,
    pub booking_email: Option<String>,
    pub booking_note: Option<String>,
    pub booking_status: Option<String>,
    pub booking_created_at: Option<DateTime<Utc>>,
}

impl From<DbSessionType> for SessionType {
    fn from(row: DbSessionType) -> Self {
        SessionType {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            duration_minutes: row.duration_minutes,
            price_cents: row.price_cents,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbAvailabilityRule> for AvailabilityRule {
    type Error = SchedError;

    fn try_from(row: DbAvailabilityRule) -> Result<Self, Self::Error> {
        let day_of_week = u8::try_from(row.day_of_week)
            .ok()
            .filter(|day| *day <= 6)
            .ok_or_else(|| {
                SchedError::Database(eyre!(
                    "Rule {} has invalid day_of_week {}",
                    row.id,
                    row.day_of_week
                ))
            })?;
        Ok(AvailabilityRule {
            id: row.id,
            user_id: row.user_id,
            day_of_week,
            start_time: row.start_time.into(),
            end_time: row.end_time.into(),
            session_type_id: row.session_type_id,
            created_at: row.created_at,
        })
    }
}

impl From<DbAvailabilityOverride> for AvailabilityOverride {
    fn from(row: DbAvailabilityOverride) -> Self {
        AvailabilityOverride {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            status: OverrideStatus::from(row.status),
            start_time: row.start_time.map(Into::into),
            end_time: row.end_time.map(Into::into),
            created_at: row.created_at,
        }
    }
}

impl From<DbCalendarSlot> for CalendarSlot {
    fn from(row: DbCalendarSlot) -> Self {
        CalendarSlot {
            id: row.id,
            user_id: row.user_id,
            start_time: row.start_time,
            end_time: row.end_time,
            is_booked: row.is_booked,
            is_archived: row.is_archived,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbBooking> for Booking {
    type Error = SchedError;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            slot_id: row.slot_id,
            session_type_id: row.session_type_id,
            name: row.name,
            email: row.email,
            note: row.note,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbBookingWithSlot> for BookingWithSlot {
    type Error = SchedError;

    fn try_from(row: DbBookingWithSlot) -> Result<Self, Self::Error> {
        let slot = CalendarSlot {
            id: row.booking.slot_id,
            user_id: row.slot_user_id,
            start_time: row.slot_start_time,
            end_time: row.slot_end_time,
            is_booked: row.slot_is_booked,
            is_archived: row.slot_is_archived,
            created_at: row.slot_created_at,
        };
        Ok(BookingWithSlot {
            booking: row.booking.try_into()?,
            slot,
        })
    }
}

impl DbSlotWithBooking {
    /// Reassembles the optional booking half of the row.
    pub fn booking(&self) -> Result<Option<Booking>, SchedError> {
        let (
            Some(id),
            Some(session_type_id),
            Some(name),
            Some(email),
            Some(status),
            Some(created_at),
        ) = (
            self.booking_id,
            self.booking_session_type_id,
            self.booking_name.clone(),
            self.booking_email.clone(),
            self.booking_status.as_deref(),
            self.booking_created_at,
        )
        else {
            return Ok(None);
        };

        Ok(Some(Booking {
            id,
            slot_id: self.slot.id,
            session_type_id,
            name,
            email,
            note: self.booking_note.clone(),
            status: status.parse()?,
            created_at,
        }))
    }
}
