//! Configuration loader for the `sensor-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Everything downstream receives typed values from
//! [`Config`] instead of reading the environment itself.
//!
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::FixedOffset;

use crate::views::ViewSettings;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional signed integer environment variable with a default value.
macro_rules! parse_env_i32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<i32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Sensor records API URL (returns the full record collection).
    pub api_url: String,

    /// Seconds between refreshes of the record snapshot.
    pub poll_interval_secs: u32,

    /// Seconds before a single fetch from the sensor API is abandoned.
    pub fetch_timeout_secs: u32,

    /// Width of one history window, in hours.
    pub history_window_hours: u32,

    /// Records per page in the record browser.
    pub page_size: u32,

    /// Rows in the dashboard's recent-records table.
    pub recent_limit: u32,

    /// Display zone as minutes east of UTC.
    pub utc_offset_minutes: i32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SENSOR_API_URL` – sensor records API URL
///
/// Optional:
/// - `POLL_INTERVAL_SECS` – refresh interval (default: 30)
/// - `FETCH_TIMEOUT_SECS` – per-fetch timeout (default: 10)
/// - `HISTORY_WINDOW_HOURS` – history window width (default: 12)
/// - `PAGE_SIZE` – record browser page size (default: 15)
/// - `RECENT_LIMIT` – recent-records table size (default: 50)
/// - `DISPLAY_UTC_OFFSET_MINUTES` – display zone offset (default: 0)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = require_env!("SENSOR_API_URL");
    let poll_interval_secs = parse_env_u32!("POLL_INTERVAL_SECS", 30);
    let fetch_timeout_secs = parse_env_u32!("FETCH_TIMEOUT_SECS", 10);
    let history_window_hours = parse_env_u32!("HISTORY_WINDOW_HOURS", 12);
    let page_size = parse_env_u32!("PAGE_SIZE", 15);
    let recent_limit = parse_env_u32!("RECENT_LIMIT", 50);
    let utc_offset_minutes = parse_env_i32!("DISPLAY_UTC_OFFSET_MINUTES", 0);

    let bind_addr = env::var("BIND_ADDR")
        .ok()
        .map(|v| v.parse::<SocketAddr>())
        .transpose()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

    let cfg = Config {
        api_url,
        poll_interval_secs,
        fetch_timeout_secs,
        history_window_hours,
        page_size,
        recent_limit,
        utc_offset_minutes,
        bind_addr,
    };
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    // ---
    fn validate(&self) -> Result<()> {
        // ---
        if self.poll_interval_secs == 0 {
            bail!("Invalid POLL_INTERVAL_SECS: must be at least 1");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("Invalid FETCH_TIMEOUT_SECS: must be at least 1");
        }
        if self.history_window_hours == 0 {
            bail!("Invalid HISTORY_WINDOW_HOURS: must be at least 1");
        }
        if self.page_size == 0 {
            bail!("Invalid PAGE_SIZE: must be at least 1");
        }
        self.zone()?;
        Ok(())
    }

    /// Display zone as a fixed offset.
    pub fn zone(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!(
                    "Invalid DISPLAY_UTC_OFFSET_MINUTES: {} is out of range",
                    self.utc_offset_minutes
                )
            })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs as u64)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs as u64)
    }

    /// Engine settings derived from this configuration.
    pub fn view_settings(&self) -> Result<ViewSettings> {
        // ---
        Ok(ViewSettings {
            window: chrono::Duration::hours(self.history_window_hours as i64),
            page_size: self.page_size as usize,
            recent_limit: self.recent_limit as usize,
            zone: self.zone()?,
        })
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_API_URL             : {}", self.api_url);
        tracing::info!("  POLL_INTERVAL_SECS         : {}", self.poll_interval_secs);
        tracing::info!("  FETCH_TIMEOUT_SECS         : {}", self.fetch_timeout_secs);
        tracing::info!("  HISTORY_WINDOW_HOURS       : {}", self.history_window_hours);
        tracing::info!("  PAGE_SIZE                  : {}", self.page_size);
        tracing::info!("  RECENT_LIMIT               : {}", self.recent_limit);
        tracing::info!("  DISPLAY_UTC_OFFSET_MINUTES : {}", self.utc_offset_minutes);
        tracing::info!("  BIND_ADDR                  : {}", self.bind_addr);
    }
}
