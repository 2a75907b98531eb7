//! Saving availability (rules and overrides) and session types.
//!
//! Every schedule change is validated in full before anything is written, is
//! stored in one transaction, and then rematerializes the user's slots.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::{SchedError, SchedResult};
use crate::materializer::{MaterializeReport, SlotMaterializer};
use crate::models::{
    availability::{
        AvailabilityOverride, AvailabilityRule, BulkAvailabilityRequest, DaySchedule,
        NewAvailabilityOverride, NewAvailabilityRule, OverrideInput, OverrideStatus,
        SaveRulesRequest, parse_day_name,
    },
    session_type::{CreateSessionTypeRequest, NewSessionType, SessionType},
};
use crate::store::SchedulingStore;
use crate::time::WallClockTime;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSaved {
    pub rules: usize,
    pub overrides: Option<usize>,
    pub slots: MaterializeReport,
}

/// Converts the weekly schedule payload into rules. Disabled days are skipped.
pub fn parse_schedule(days: &[DaySchedule]) -> SchedResult<Vec<NewAvailabilityRule>> {
    let mut rules = Vec::new();
    for day in days {
        let day_of_week = parse_day_name(&day.day)
            .ok_or_else(|| SchedError::validation(format!("Unknown day '{}'", day.day)))?;
        if !day.enabled {
            continue;
        }
        for block in &day.blocks {
            let start: WallClockTime = block.start.parse()?;
            let end: WallClockTime = block.end.parse()?;
            if start >= end {
                return Err(SchedError::validation(format!(
                    "Block {}-{} on {} must start before it ends",
                    start, end, day.day
                )));
            }
            rules.push(NewAvailabilityRule {
                day_of_week,
                start_time: start,
                end_time: end,
                session_type_id: block.session_type_id,
            });
        }
    }
    Ok(rules)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only its date.
fn parse_override_date(raw: &str) -> SchedResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
        .map_err(|_| SchedError::validation(format!("Invalid override date '{}'", raw)))
}

fn parse_optional_time(raw: Option<&str>) -> SchedResult<Option<WallClockTime>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map(Some),
        None => Ok(None),
    }
}

pub fn parse_override(input: &OverrideInput) -> SchedResult<NewAvailabilityOverride> {
    let date = parse_override_date(&input.date)?;
    let status = OverrideStatus::from(input.status.trim().to_lowercase());
    if let OverrideStatus::Unrecognized(raw) = &status {
        return Err(SchedError::validation(format!("Unknown override status '{}'", raw)));
    }

    let start_time = parse_optional_time(input.start.as_deref())?;
    let end_time = parse_optional_time(input.end.as_deref())?;

    if status.grants_availability() {
        match (start_time, end_time) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => {
                return Err(SchedError::validation(format!(
                    "Override on {} must start before it ends",
                    date
                )));
            }
            _ => {
                return Err(SchedError::validation(format!(
                    "Override on {} needs a start and end time",
                    date
                )));
            }
        }
    }

    Ok(NewAvailabilityOverride {
        date,
        status,
        start_time,
        end_time,
    })
}

pub fn parse_overrides(inputs: &[OverrideInput]) -> SchedResult<Vec<NewAvailabilityOverride>> {
    let mut dates = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let parsed = parse_override(input)?;
            if !dates.insert(parsed.date) {
                return Err(SchedError::validation(format!(
                    "More than one override for {}",
                    parsed.date
                )));
            }
            Ok(parsed)
        })
        .collect()
}

pub struct ScheduleService {
    store: Arc<dyn SchedulingStore>,
    materializer: Arc<SlotMaterializer>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn SchedulingStore>, materializer: Arc<SlotMaterializer>) -> Self {
        Self {
            store,
            materializer,
        }
    }

    pub async fn rules(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityRule>> {
        self.store.rules_for_user(user_id).await
    }

    pub async fn overrides(&self, user_id: Uuid) -> SchedResult<Vec<AvailabilityOverride>> {
        self.store.overrides_for_user(user_id).await
    }

    /// Replaces the user's weekly rules wholesale.
    pub async fn save_rules(
        &self,
        user_id: Uuid,
        request: SaveRulesRequest,
        now: DateTime<Utc>,
    ) -> SchedResult<ScheduleSaved> {
        let days = request
            .schedule
            .ok_or_else(|| SchedError::validation("Invalid schedule data."))?;
        let rules = parse_schedule(&days)?;
        self.check_session_types(user_id, &rules).await?;

        let rule_count = rules.len();
        self.store.replace_schedule(user_id, rules, None).await?;
        info!("Saved {} availability rules for user {}", rule_count, user_id);

        let slots = self.materializer.materialize(user_id, now).await?;
        Ok(ScheduleSaved {
            rules: rule_count,
            overrides: None,
            slots,
        })
    }

    /// Replaces the user's weekly rules and overrides together.
    pub async fn save_bulk(
        &self,
        user_id: Uuid,
        request: BulkAvailabilityRequest,
        now: DateTime<Utc>,
    ) -> SchedResult<ScheduleSaved> {
        let days = request
            .schedule
            .ok_or_else(|| SchedError::validation("Invalid schedule data."))?;
        let rules = parse_schedule(&days)?;
        let overrides = parse_overrides(&request.overrides)?;
        self.check_session_types(user_id, &rules).await?;

        let rule_count = rules.len();
        let override_count = overrides.len();
        self.store
            .replace_schedule(user_id, rules, Some(overrides))
            .await?;
        info!(
            "Saved {} rules and {} overrides for user {}",
            rule_count, override_count, user_id
        );

        let slots = self.materializer.materialize(user_id, now).await?;
        Ok(ScheduleSaved {
            rules: rule_count,
            overrides: Some(override_count),
            slots,
        })
    }

    /// Adds (or replaces) the override for a single date.
    pub async fn add_override(
        &self,
        user_id: Uuid,
        input: OverrideInput,
        now: DateTime<Utc>,
    ) -> SchedResult<AvailabilityOverride> {
        let entry = parse_override(&input)?;
        let saved = self.store.upsert_override(user_id, entry).await?;
        self.materializer.materialize(user_id, now).await?;
        Ok(saved)
    }

    pub async fn generate_slots(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> SchedResult<MaterializeReport> {
        self.materializer.materialize(user_id, now).await
    }

    async fn check_session_types(
        &self,
        user_id: Uuid,
        rules: &[NewAvailabilityRule],
    ) -> SchedResult<()> {
        let referenced: HashSet<Uuid> = rules.iter().filter_map(|r| r.session_type_id).collect();
        for session_type_id in referenced {
            let owned = self
                .store
                .session_type_by_id(session_type_id)
                .await?
                .is_some_and(|t| t.user_id == user_id);
            if !owned {
                return Err(SchedError::validation(format!(
                    "Unknown session type {}",
                    session_type_id
                )));
            }
        }
        Ok(())
    }

    pub async fn session_types(&self, user_id: Uuid) -> SchedResult<Vec<SessionType>> {
        self.store.session_types_for_user(user_id).await
    }

    pub async fn create_session_type(
        &self,
        user_id: Uuid,
        request: CreateSessionTypeRequest,
    ) -> SchedResult<SessionType> {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SchedError::validation("Session type name is required."))?;
        let duration_minutes = request
            .duration_minutes
            .filter(|d| *d > 0)
            .ok_or_else(|| SchedError::validation("Duration must be a positive number of minutes."))?;
        if request.price_cents.is_some_and(|p| p < 0) {
            return Err(SchedError::validation("Price cannot be negative."));
        }

        self.store
            .insert_session_type(
                user_id,
                NewSessionType {
                    name,
                    duration_minutes,
                    price_cents: request.price_cents,
                },
            )
            .await
    }

    pub async fn delete_session_type(
        &self,
        session_type_id: Uuid,
        user_id: Uuid,
    ) -> SchedResult<()> {
        let session_type = self
            .store
            .session_type_by_id(session_type_id)
            .await?
            .ok_or_else(|| SchedError::not_found("Session type not found."))?;
        if session_type.user_id != user_id {
            return Err(SchedError::Authorization(
                "You do not own this session type.".to_string(),
            ));
        }
        self.store.delete_session_type(session_type_id).await
    }
}
