use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use schedlite_core::errors::SchedResult;
use schedlite_core::materializer::{MaterializeAllReport, SlotMaterializer};
use tracing::{debug, error};

/// Regenerates slots for every known user once.
pub async fn refresh_once(materializer: &SlotMaterializer) -> SchedResult<MaterializeAllReport> {
    materializer.materialize_all(Utc::now()).await
}

/// Background task that keeps every user's rolling window filled.
pub async fn run_slot_refresher(materializer: Arc<SlotMaterializer>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        debug!("Running scheduled slot refresh");
        // Listing users failed; the next tick retries.
        if let Err(err) = refresh_once(&materializer).await {
            error!("Slot refresh failed: {:?}", err);
        }
    }
}
