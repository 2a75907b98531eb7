use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::WallClockTime;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Day-of-week index used by rules: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Maps an English day name (case-insensitive) to its rule index.
pub fn parse_day_name(name: &str) -> Option<u8> {
    DAY_NAMES
        .iter()
        .position(|day| day.eq_ignore_ascii_case(name.trim()))
        .map(|idx| idx as u8)
}

/// Recurring weekly availability block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_of_week: u8,
    pub start_time: WallClockTime,
    pub end_time: WallClockTime,
    pub session_type_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailabilityRule {
    pub day_of_week: u8,
    pub start_time: WallClockTime,
    pub end_time: WallClockTime,
    pub session_type_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OverrideStatus {
    Unavailable,
    Available,
    Custom,
    /// Any other stored value. Never accepted from requests, but tolerated
    /// when read back so a bad row cannot break materialization.
    Unrecognized(String),
}

impl OverrideStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OverrideStatus::Unavailable => "unavailable",
            OverrideStatus::Available => "available",
            OverrideStatus::Custom => "custom",
            OverrideStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn grants_availability(&self) -> bool {
        matches!(self, OverrideStatus::Available | OverrideStatus::Custom)
    }
}

impl From<String> for OverrideStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "unavailable" => OverrideStatus::Unavailable,
            "available" => OverrideStatus::Available,
            "custom" => OverrideStatus::Custom,
            _ => OverrideStatus::Unrecognized(raw),
        }
    }
}

impl From<OverrideStatus> for String {
    fn from(status: OverrideStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date-specific exception that supersedes the rules for that date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: OverrideStatus,
    pub start_time: Option<WallClockTime>,
    pub end_time: Option<WallClockTime>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailabilityOverride {
    pub date: NaiveDate,
    pub status: OverrideStatus,
    pub start_time: Option<WallClockTime>,
    pub end_time: Option<WallClockTime>,
}

// Request payloads. Fields are kept loose (strings, options) so that every
// malformed value is reported as a validation error by the schedule service
// instead of a generic deserialization failure.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub start: String,
    pub end: String,
    pub session_type_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideInput {
    pub date: String,
    pub status: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRulesRequest {
    pub schedule: Option<Vec<DaySchedule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAvailabilityRequest {
    pub schedule: Option<Vec<DaySchedule>>,
    #[serde(default)]
    pub overrides: Vec<OverrideInput>,
}
