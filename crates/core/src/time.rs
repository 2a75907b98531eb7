//! Wall-clock time of day, as used by availability rules and overrides.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SchedError;

/// A time of day without a date, e.g. `09:30`.
///
/// Parsing is strict: `HH:MM` or `HH:MM:SS`, every field exactly two digits.
/// Inputs such as `9:30`, `09:30pm` or `24:00` are rejected rather than
/// coerced into some other time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallClockTime(NaiveTime);

impl WallClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// Combines this time with a calendar date.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl From<NaiveTime> for WallClockTime {
    fn from(time: NaiveTime) -> Self {
        // Sub-second precision never comes from user input.
        Self(time.with_nanosecond(0).unwrap_or(time))
    }
}

fn two_digits(field: &str) -> Option<u32> {
    if field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().ok()
    } else {
        None
    }
}

impl FromStr for WallClockTime {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedError::Validation(format!("Invalid time '{}', expected HH:MM", s));

        let fields: Vec<&str> = s.split(':').collect();
        let (hour, minute, second) = match fields.as_slice() {
            [h, m] => (two_digits(h), two_digits(m), Some(0)),
            [h, m, sec] => (two_digits(h), two_digits(m), two_digits(sec)),
            _ => return Err(invalid()),
        };

        match (hour, minute, second) {
            (Some(h), Some(m), Some(sec)) => NaiveTime::from_hms_opt(h, m, sec)
                .map(Self)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for WallClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        }
    }
}

impl Serialize for WallClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
