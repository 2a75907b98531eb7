use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::Booking;

/// A concrete bookable time range owned by one user.
///
/// An archived slot is a frozen copy that only carries a cancelled booking's
/// history. It is never bookable and does not take part in overlap checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSlot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl CalendarSlot {
    /// Live and not booked.
    pub fn is_open(&self) -> bool {
        !self.is_booked && !self.is_archived
    }

    pub fn range(&self) -> SlotRange {
        SlotRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Half-open `[start, end)` interval with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SlotRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &SlotRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotWithBooking {
    #[serde(flatten)]
    pub slot: CalendarSlot,
    pub booking: Option<Booking>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Outcome of one atomic replacement of a user's future slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSwap {
    pub removed: u64,
    pub inserted: u64,
    pub skipped: u64,
}
