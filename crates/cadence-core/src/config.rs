//! Analytics configuration
//!
//! The window policies that decide how the analysis range and the "current
//! week" are derived, plus the noise threshold for trend insights.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (`--config`), if it exists
//! 2. The override in the data dir (~/.local/share/cadence/config/analytics.toml)
//! 3. The embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file was used.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Default week-over-week change that is considered noise
pub const DEFAULT_NOISE_THRESHOLD: u64 = 5;

/// How the start of the analysis window is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStartPolicy {
    /// First day of the month containing the earliest observation
    FirstObservationMonth,
    /// A pinned calendar date
    Fixed(NaiveDate),
}

impl fmt::Display for AnalysisStartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstObservationMonth => write!(f, "first-observation-month"),
            Self::Fixed(date) => write!(f, "{}", date),
        }
    }
}

impl FromStr for AnalysisStartPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "first-observation-month" | "first_observation_month" => {
                Ok(Self::FirstObservationMonth)
            }
            _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Self::Fixed)
                .map_err(|_| {
                    format!(
                        "Unknown analysis start: {} (valid: first-observation-month, YYYY-MM-DD)",
                        s
                    )
                }),
        }
    }
}

/// How the current week is anchored relative to the window end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStartPolicy {
    /// Most recent Monday on or before the window end
    CalendarMonday,
    /// The 7 days ending at the window end
    Rolling7Day,
}

impl WeekStartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarMonday => "calendar-monday",
            Self::Rolling7Day => "rolling-7-day",
        }
    }
}

impl fmt::Display for WeekStartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WeekStartPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "calendar-monday" | "monday" => Ok(Self::CalendarMonday),
            "rolling-7-day" | "rolling" => Ok(Self::Rolling7Day),
            _ => Err(format!(
                "Unknown week start: {} (valid: calendar-monday, rolling-7-day)",
                s
            )),
        }
    }
}

/// Configuration recognized by the analytics engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub analysis_start: AnalysisStartPolicy,
    pub week_start: WeekStartPolicy,
    /// Optional hard cap on the window end
    pub hard_cap_end: Option<NaiveDate>,
    /// Week-over-week changes with magnitude at or below this are not reported
    pub noise_threshold: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            analysis_start: AnalysisStartPolicy::FirstObservationMonth,
            week_start: WeekStartPolicy::CalendarMonday,
            hard_cap_end: None,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
        }
    }
}

impl AnalyticsConfig {
    /// Load config from the resolved file, then apply environment overrides
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = read_config_file(override_path)?;
        Self::from_toml(&content)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a TOML config document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(window) = raw.window {
            if let Some(start) = window.analysis_start {
                config.analysis_start = start.parse().map_err(Error::Config)?;
            }
            if let Some(week) = window.week_start {
                config.week_start = week.parse().map_err(Error::Config)?;
            }
            if let Some(cap) = window.hard_cap_end {
                config.hard_cap_end = Some(parse_config_date("hard_cap_end", &cap)?);
            }
        }

        if let Some(insights) = raw.insights {
            if let Some(threshold) = insights.noise_threshold {
                config.noise_threshold = threshold;
            }
        }

        Ok(config)
    }

    /// Apply `CADENCE_*` overrides using the given variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(start) = get("CADENCE_ANALYSIS_START") {
            self.analysis_start = start.parse().map_err(Error::Config)?;
        }
        if let Some(week) = get("CADENCE_WEEK_START") {
            self.week_start = week.parse().map_err(Error::Config)?;
        }
        if let Some(cap) = get("CADENCE_END_CAP") {
            self.hard_cap_end = Some(parse_config_date("CADENCE_END_CAP", &cap)?);
        }
        if let Some(threshold) = get("CADENCE_NOISE_THRESHOLD") {
            self.noise_threshold = threshold.trim().parse().map_err(|_| {
                Error::Config(format!("Invalid CADENCE_NOISE_THRESHOLD: {}", threshold))
            })?;
        }

        Ok(self)
    }
}

/// Get the default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cadence").join("config").join("analytics.toml"))
}

fn read_config_file(override_path: Option<&Path>) -> Result<String> {
    let candidate = match override_path {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            None
        }
        None => default_config_path().filter(|p| p.exists()),
    };

    match candidate {
        Some(path) => {
            debug!(path = %path.display(), "Loading analytics config");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))
        }
        None => Ok(DEFAULT_CONFIG.to_string()),
    }
}

fn parse_config_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Config(format!("Invalid {} date: {} (use YYYY-MM-DD)", key, value)))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    window: Option<RawWindow>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    analysis_start: Option<String>,
    week_start: Option<String>,
    hard_cap_end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    noise_threshold: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_embedded_default_matches_default() {
        let config = AnalyticsConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn test_parse_fixed_start_and_cap() {
        let config = AnalyticsConfig::from_toml(
            r#"
            [window]
            analysis_start = "2023-07-10"
            week_start = "rolling-7-day"
            hard_cap_end = "2025-10-19"

            [insights]
            noise_threshold = 10
            "#,
        )
        .unwrap();

        assert_eq!(
            config.analysis_start,
            AnalysisStartPolicy::Fixed(NaiveDate::from_ymd_opt(2023, 7, 10).unwrap())
        );
        assert_eq!(config.week_start, WeekStartPolicy::Rolling7Day);
        assert_eq!(config.hard_cap_end, NaiveDate::from_ymd_opt(2025, 10, 19));
        assert_eq!(config.noise_threshold, 10);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AnalyticsConfig::from_toml("[insights]\nnoise_threshold = 2\n").unwrap();
        assert_eq!(
            config.analysis_start,
            AnalysisStartPolicy::FirstObservationMonth
        );
        assert_eq!(config.noise_threshold, 2);
    }

    #[test]
    fn test_invalid_week_start_rejected() {
        let result = AnalyticsConfig::from_toml("[window]\nweek_start = \"sunday\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CADENCE_ANALYSIS_START", "2023-07-10"),
            ("CADENCE_WEEK_START", "rolling_7_day"),
            ("CADENCE_NOISE_THRESHOLD", "8"),
            ("CADENCE_END_CAP", ""),
        ]
        .into_iter()
        .collect();

        let config = AnalyticsConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            config.analysis_start,
            AnalysisStartPolicy::Fixed(NaiveDate::from_ymd_opt(2023, 7, 10).unwrap())
        );
        assert_eq!(config.week_start, WeekStartPolicy::Rolling7Day);
        assert_eq!(config.noise_threshold, 8);
        assert_eq!(config.hard_cap_end, None);
    }

    #[test]
    fn test_missing_override_path_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let content = read_config_file(Some(&missing)).unwrap();
        assert_eq!(content, DEFAULT_CONFIG);
    }

    #[test]
    fn test_policy_display_round_trips() {
        let fixed = AnalysisStartPolicy::Fixed(NaiveDate::from_ymd_opt(2023, 7, 10).unwrap());
        assert_eq!(fixed.to_string().parse::<AnalysisStartPolicy>().unwrap(), fixed);
        assert_eq!(
            WeekStartPolicy::Rolling7Day
                .to_string()
                .parse::<WeekStartPolicy>()
                .unwrap(),
            WeekStartPolicy::Rolling7Day
        );
    }
}
