//! # SchedLite Core
//!
//! Domain types and scheduling logic for the SchedLite appointment backend.
//!
//! Users describe recurring weekly availability ([`models::availability::AvailabilityRule`])
//! and date-specific exceptions ([`models::availability::AvailabilityOverride`]). The
//! [`materializer::SlotMaterializer`] expands those into concrete
//! [`models::slot::CalendarSlot`]s for a rolling window, and the
//! [`booking::BookingEngine`] lets external clients reserve and cancel them.
//!
//! Persistence goes through the [`store::SchedulingStore`] trait. The `schedlite-db`
//! crate implements it for PostgreSQL and [`store::memory::MemoryStore`] implements it
//! in memory.

pub mod booking;
pub mod errors;
pub mod materializer;
pub mod models;
pub mod resolver;
pub mod schedule;
pub mod store;
pub mod time;
