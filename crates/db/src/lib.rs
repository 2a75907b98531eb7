//! PostgreSQL persistence for SchedLite.
//!
//! [`repositories`] holds one module of plain query functions per table;
//! [`store::PgStore`] composes them into transactions behind the
//! [`schedlite_core::store::SchedulingStore`] trait.

pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub use store::PgStore;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
