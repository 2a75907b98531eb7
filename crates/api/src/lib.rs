//! # SchedLite API
//!
//! The web server for the SchedLite appointment backend: owners manage
//! availability, session types and slots behind bearer-token auth, while the
//! public lists open slots and books them.
//!
//! ## Architecture
//!
//! - **Routes**: API endpoints and URL structure
//! - **Handlers**: request extraction and response shaping around the core services
//! - **Middleware**: bearer-token identity and error-to-status mapping
//! - **Config**: environment configuration
//! - **Refresher**: optional background slot regeneration
//!
//! Persistence is injected as a [`SchedulingStore`], so the same router runs
//! against PostgreSQL in production and an in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Periodic slot regeneration
pub mod refresher;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use chrono_tz::Tz;
use eyre::{Result, WrapErr};
use schedlite_core::{
    booking::BookingEngine, materializer::SlotMaterializer, schedule::ScheduleService,
    store::SchedulingStore,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use middleware::auth::{IdentityVerifier, JwtVerifier};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub materializer: Arc<SlotMaterializer>,
    pub bookings: BookingEngine,
    pub schedules: ScheduleService,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        identity: Arc<dyn IdentityVerifier>,
        window_days: u32,
        tz: Tz,
    ) -> Self {
        let materializer = Arc::new(SlotMaterializer::new(store.clone(), window_days, tz));
        Self {
            bookings: BookingEngine::new(store.clone()),
            schedules: ScheduleService::new(store, materializer.clone()),
            materializer,
            identity,
        }
    }
}

/// Builds the application router with all routes and request tracing.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Availability management endpoints
        .merge(routes::rules::routes())
        .merge(routes::overrides::routes())
        .merge(routes::session_types::routes())
        // Slot and booking endpoints
        .merge(routes::slots::routes())
        .merge(routes::bookings::routes())
        // Attach shared state to all routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("Invalid CORS origin '{}'", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true))
}

/// Starts the API server on top of the given store.
///
/// Sets up logging, builds the router, spawns the slot refresher when an
/// interval is configured and serves until the listener fails.
pub async fn start_server(
    config: config::ApiConfig,
    store: Arc<dyn SchedulingStore>,
) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let identity: Arc<dyn IdentityVerifier> = Arc::new(JwtVerifier::new(&config.jwt_secret));
    let state = Arc::new(ApiState::new(
        store,
        identity,
        config.slot_window_days,
        config.schedule_timezone,
    ));
    info!(
        "Materializing {} days of slots in {}",
        config.slot_window_days,
        config.schedule_timezone.name()
    );

    if let Some(every) = config.slot_refresh_interval {
        info!("Refreshing slots every {:?}", every);
        tokio::spawn(refresher::run_slot_refresher(
            state.materializer.clone(),
            every,
        ));
    }

    let app = router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)?),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
            .into_inner(),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
