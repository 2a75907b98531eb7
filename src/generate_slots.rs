//! Regenerates the rolling slot window for every known user.
//!
//! Meant to be run by cron (or by hand) at least once a day. Failures for
//! individual users are logged and counted; the process still exits 0.

use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use dotenv::dotenv;
use schedlite_api::config::ApiConfig;
use schedlite_core::materializer::SlotMaterializer;
use schedlite_db::{PgStore, create_pool};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db_pool = create_pool(&config.database_url).await?;
    let materializer = SlotMaterializer::new(
        Arc::new(PgStore::new(db_pool)),
        config.slot_window_days,
        config.schedule_timezone,
    );

    info!(
        "Generating {} days of slots in {}",
        materializer.window_days(),
        materializer.time_zone().name()
    );
    let report = materializer.materialize_all(Utc::now()).await?;
    println!(
        "Slot generation complete: {} users succeeded, {} failed",
        report.succeeded, report.failed
    );

    Ok(())
}
