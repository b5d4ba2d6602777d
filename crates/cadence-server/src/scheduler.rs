//! Background task scheduler for periodic source refresh
//!
//! Enabled by default and configured via environment variables:
//!
//! - `CADENCE_REFRESH_MINUTES`: Interval in minutes (default: 60, 0 disables)
//!
//! The scheduler runs in the background and reloads the source at the
//! configured interval. Failures are logged and the previous report stays
//! published.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::refresh::Refresher;

/// Default refresh interval in minutes
pub const DEFAULT_REFRESH_MINUTES: u64 = 60;

/// Configuration for scheduled refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshScheduleConfig {
    /// Interval between refreshes in minutes
    pub interval_minutes: u64,
}

impl Default for RefreshScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_REFRESH_MINUTES,
        }
    }
}

impl RefreshScheduleConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None if scheduling is disabled (CADENCE_REFRESH_MINUTES=0)
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_minutes = match lookup("CADENCE_REFRESH_MINUTES") {
            Some(value) => match value.trim().parse() {
                Ok(minutes) => minutes,
                Err(_) => {
                    warn!(
                        value = %value,
                        "Invalid CADENCE_REFRESH_MINUTES, using default of {} minutes",
                        DEFAULT_REFRESH_MINUTES
                    );
                    DEFAULT_REFRESH_MINUTES
                }
            },
            None => DEFAULT_REFRESH_MINUTES,
        };

        Self::from_minutes(interval_minutes)
    }

    /// Schedule for an explicit interval; 0 disables
    pub fn from_minutes(interval_minutes: u64) -> Option<Self> {
        if interval_minutes == 0 {
            warn!("Refresh interval is 0, automatic refresh disabled");
            return None;
        }
        Some(Self { interval_minutes })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// Start the refresh scheduler as a background task
///
/// This function spawns a tokio task that runs indefinitely, refreshing
/// the report at the configured interval.
pub fn start_refresh_scheduler(refresher: Arc<Refresher>, config: RefreshScheduleConfig) {
    info!(
        "Starting refresh scheduler: every {} minutes",
        config.interval_minutes
    );

    let period = config.interval();
    let next_after = move || {
        chrono::Duration::from_std(period)
            .ok()
            .map(|step| Utc::now() + step)
    };

    tokio::spawn(async move {
        let mut ticker = interval(period);

        // Skip the first immediate tick - startup already refreshed
        ticker.tick().await;
        refresher.set_next_refresh(next_after());

        loop {
            ticker.tick().await;
            refresher.set_next_refresh(next_after());

            info!("Running scheduled refresh...");

            match refresher.refresh().await {
                Ok(summary) => {
                    info!(
                        "Scheduled refresh completed: {} data points",
                        summary.data_points
                    );
                }
                Err(e) => {
                    error!("Scheduled refresh failed: {:#}", e);
                }
            }
        }
    });
}
