//! Slot materialization: expanding rules and overrides into concrete future
//! slots for a rolling window of days.

use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::SchedResult;
use crate::models::{
    availability::{AvailabilityOverride, AvailabilityRule},
    slot::SlotRange,
};
use crate::resolver::resolve;
use crate::store::SchedulingStore;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeReport {
    pub candidates: u64,
    pub removed: u64,
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeAllReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Filters `candidates` down to a set that can be inserted next to `kept`
/// without breaking the no-overlap invariant.
///
/// Candidates are taken in start order; one is skipped when it overlaps a kept
/// slot or a candidate already accepted. Returns the accepted ranges and the
/// number skipped.
pub fn reconcile(mut candidates: Vec<SlotRange>, kept: &[SlotRange]) -> (Vec<SlotRange>, usize) {
    candidates.sort();
    let total = candidates.len();

    let mut accepted: Vec<SlotRange> = Vec::with_capacity(total);
    for candidate in candidates {
        if kept.iter().any(|k| k.overlaps(&candidate)) {
            continue;
        }
        // Accepted ranges are sorted and disjoint, so only the last can overlap.
        if accepted.last().is_some_and(|last| last.overlaps(&candidate)) {
            continue;
        }
        accepted.push(candidate);
    }

    let skipped = total - accepted.len();
    (accepted, skipped)
}

pub struct SlotMaterializer {
    store: Arc<dyn SchedulingStore>,
    window_days: u32,
    tz: Tz,
}

impl SlotMaterializer {
    pub fn new(store: Arc<dyn SchedulingStore>, window_days: u32, tz: Tz) -> Self {
        Self {
            store,
            window_days,
            tz,
        }
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Resolves every day of the window starting at `now`'s local date.
    /// Ranges that start before `now` are dropped.
    pub fn candidate_slots(
        &self,
        rules: &[AvailabilityRule],
        overrides: &[AvailabilityOverride],
        now: DateTime<Utc>,
    ) -> Vec<SlotRange> {
        let first_day = now.with_timezone(&self.tz).date_naive();

        (0..self.window_days)
            .filter_map(|offset| first_day.checked_add_days(Days::new(u64::from(offset))))
            .flat_map(|date| resolve(rules, overrides, date, &self.tz))
            .filter(|range| range.start >= now)
            .collect()
    }

    /// Regenerates one user's future slots.
    ///
    /// Booked slots, past slots and slots with booking history are left alone;
    /// everything else in the future is replaced in a single store transaction.
    /// Running it again with unchanged rules produces the same slot ranges.
    pub async fn materialize(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> SchedResult<MaterializeReport> {
        let rules = self.store.rules_for_user(user_id).await?;
        let overrides = self.store.overrides_for_user(user_id).await?;

        let candidates = self.candidate_slots(&rules, &overrides, now);
        let candidate_count = candidates.len() as u64;
        debug!(
            "Resolved {} candidate slots for user {} from {} rules and {} overrides",
            candidate_count,
            user_id,
            rules.len(),
            overrides.len()
        );

        let swap = self
            .store
            .swap_future_slots(user_id, now, candidates)
            .await?;

        let report = MaterializeReport {
            candidates: candidate_count,
            removed: swap.removed,
            inserted: swap.inserted,
            skipped: swap.skipped,
        };
        info!(
            user_id = %user_id,
            removed = report.removed,
            inserted = report.inserted,
            skipped = report.skipped,
            "Materialized future slots"
        );
        Ok(report)
    }

    /// Materializes every known user. A failure for one user is logged and
    /// counted, and the remaining users are still processed.
    pub async fn materialize_all(&self, now: DateTime<Utc>) -> SchedResult<MaterializeAllReport> {
        let user_ids = self.store.known_user_ids().await?;
        let mut report = MaterializeAllReport::default();

        for user_id in user_ids {
            match self.materialize(user_id, now).await {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    warn!("Failed to generate slots for user {}: {}", user_id, err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Slot generation finished: {} users succeeded, {} failed",
            report.succeeded, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SchedError;
    use crate::models::slot::SlotSwap;
    use crate::store::MockSchedulingStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 5, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn materialize_all_continues_past_failures() {
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let also_good = Uuid::new_v4();

        let mut store = MockSchedulingStore::new();
        store
            .expect_known_user_ids()
            .returning(move || Ok(vec![good, bad, also_good]));
        store.expect_rules_for_user().returning(|_| Ok(vec![]));
        store.expect_overrides_for_user().returning(|_| Ok(vec![]));
        store
            .expect_swap_future_slots()
            .times(3)
            .returning(move |user_id, _, _| {
                if user_id == bad {
                    Err(SchedError::Database(eyre::eyre!("connection reset")))
                } else {
                    Ok(SlotSwap::default())
                }
            });

        let materializer = SlotMaterializer::new(Arc::new(store), DEFAULT_WINDOW_DAYS, Tz::UTC);
        let report = materializer.materialize_all(now()).await.unwrap();

        assert_eq!(report, MaterializeAllReport { succeeded: 2, failed: 1 });
    }

    #[tokio::test]
    async fn failed_swap_reports_error_for_single_user() {
        let mut store = MockSchedulingStore::new();
        store.expect_rules_for_user().returning(|_| Ok(vec![]));
        store.expect_overrides_for_user().returning(|_| Ok(vec![]));
        store
            .expect_swap_future_slots()
            .returning(|_, _, _| Err(SchedError::Database(eyre::eyre!("deadlock detected"))));

        let materializer = SlotMaterializer::new(Arc::new(store), DEFAULT_WINDOW_DAYS, Tz::UTC);
        let err = materializer.materialize(Uuid::new_v4(), now()).await.unwrap_err();
        assert!(err.is_internal());
    }
}
