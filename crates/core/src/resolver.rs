//! Availability resolution: (rules, overrides, date) -> time ranges.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::models::{
    availability::{AvailabilityOverride, AvailabilityRule, OverrideStatus, day_of_week},
    slot::SlotRange,
};
use crate::time::WallClockTime;

/// Returns the bookable ranges for `date`, earliest first.
///
/// The first override whose date equals `date` decides the day on its own:
///
/// - `unavailable` yields nothing.
/// - `available` / `custom` with both times yields exactly that range.
/// - A granting override missing a time, or any unrecognized status, yields
///   nothing. Rules are never consulted once an override matched.
///
/// Without an override, every rule for the date's weekday contributes one range.
/// Wall-clock times are interpreted in `tz`; a time that does not exist on that
/// date (DST gap) discards the range, an ambiguous one takes the earlier instant.
pub fn resolve<Tz: TimeZone>(
    rules: &[AvailabilityRule],
    overrides: &[AvailabilityOverride],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<SlotRange> {
    if let Some(entry) = overrides.iter().find(|o| o.date == date) {
        return match (&entry.status, entry.start_time, entry.end_time) {
            (OverrideStatus::Available | OverrideStatus::Custom, Some(start), Some(end)) => {
                localize(date, start, end, tz).into_iter().collect()
            }
            _ => Vec::new(),
        };
    }

    let weekday = day_of_week(date);
    let mut ranges: Vec<SlotRange> = rules
        .iter()
        .filter(|rule| rule.day_of_week == weekday)
        .filter_map(|rule| localize(date, rule.start_time, rule.end_time, tz))
        .collect();
    ranges.sort();
    ranges
}

/// Anchors a wall-clock range on `date` in `tz`. `None` unless start < end.
pub fn localize<Tz: TimeZone>(
    date: NaiveDate,
    start: WallClockTime,
    end: WallClockTime,
    tz: &Tz,
) -> Option<SlotRange> {
    let start = tz.from_local_datetime(&start.on(date)).earliest()?;
    let end = tz.from_local_datetime(&end.on(date)).earliest()?;
    SlotRange::new(start.with_timezone(&Utc), end.with_timezone(&Utc))
}
