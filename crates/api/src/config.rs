//! # API Configuration Module
//!
//! Loads configuration for the SchedLite API server from environment
//! variables, falling back to defaults where that is safe.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: port to listen on (default: 3330)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `API_CORS_ORIGINS`: comma-separated list of allowed CORS origins
//! - `JWT_SECRET`: HS256 secret used to verify bearer tokens (required)
//! - `API_REQUEST_TIMEOUT_SECONDS`: per-request timeout (default: 30)
//! - `SLOT_WINDOW_DAYS`: days of slots to materialize, 1 to 366 (default: 30)
//! - `SCHEDULE_TIMEZONE`: IANA zone rules are interpreted in (default: "UTC")
//! - `SLOT_REFRESH_INTERVAL_SECONDS`: when set, slots for every user are
//!   regenerated on this interval in the background

use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use schedlite_core::materializer::DEFAULT_WINDOW_DAYS;
use std::env;
use std::time::Duration;
use tracing::Level;

/// Configuration for the SchedLite API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use schedlite_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}", config.server_addr());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Secret for verifying bearer tokens
    pub jwt_secret: String,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Length of the rolling slot window
    pub slot_window_days: u32,

    /// Zone that rule and override wall-clock times are interpreted in
    pub schedule_timezone: Tz,

    /// Background regeneration interval; `None` disables the refresher
    pub slot_refresh_interval: Option<Duration>,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` or `JWT_SECRET` is missing, or if any numeric
    /// or time zone value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Network settings
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "3330".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;

        // Logging settings
        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = lookup("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Security settings
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| eyre!("JWT_SECRET environment variable must be set"))?;

        // Performance settings
        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Scheduling settings
        let slot_window_days = match lookup("SLOT_WINDOW_DAYS") {
            Some(raw) => raw.parse().wrap_err("Invalid SLOT_WINDOW_DAYS value")?,
            None => DEFAULT_WINDOW_DAYS,
        };
        if !(1..=366).contains(&slot_window_days) {
            return Err(eyre!(
                "SLOT_WINDOW_DAYS must be between 1 and 366, got {}",
                slot_window_days
            ));
        }

        let schedule_timezone = match lookup("SCHEDULE_TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid SCHEDULE_TIMEZONE '{}': {}", raw, e))?,
            None => Tz::UTC,
        };

        let slot_refresh_interval = match lookup("SLOT_REFRESH_INTERVAL_SECONDS") {
            Some(raw) => {
                let seconds: u64 = raw
                    .parse()
                    .wrap_err("Invalid SLOT_REFRESH_INTERVAL_SECONDS value")?;
                (seconds > 0).then(|| Duration::from_secs(seconds))
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            jwt_secret,
            request_timeout,
            slot_window_days,
            schedule_timezone,
            slot_refresh_interval,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
