//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve the analytics config (file, then env overrides)
//! - `resolve_source` - Resolve the data source from `--source` or the environment
//! - `parse_now` - Parse the `--now` reference date
//! - `build_report` - Load the source and run the engine

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cadence_core::{AnalyticsConfig, AnalyticsEngine, AnalyticsReport, DataSource};
use chrono::{Local, NaiveDate};
use tracing::debug;

pub fn load_config(config_path: Option<&Path>) -> Result<AnalyticsConfig> {
    let config = AnalyticsConfig::load(config_path).context("Failed to load analytics config")?;
    debug!(
        analysis_start = %config.analysis_start,
        week_start = %config.week_start,
        noise_threshold = config.noise_threshold,
        "Loaded analytics config"
    );
    Ok(config)
}

/// `--source` wins; otherwise fall back to `GOOGLE_SHEET_ID`
pub fn resolve_source(source: Option<&str>) -> Result<Option<DataSource>> {
    match source {
        Some(spec) => DataSource::parse(spec)
            .map(Some)
            .context("Invalid --source"),
        None => DataSource::from_env().context("Invalid source environment"),
    }
}

pub fn require_source(source: Option<&str>) -> Result<DataSource> {
    resolve_source(source)?.ok_or_else(|| {
        anyhow!("No data source configured (use --source, CADENCE_SOURCE or GOOGLE_SHEET_ID)")
    })
}

/// Parse `--now`, defaulting to today's local date
pub fn parse_now(now: Option<&str>) -> Result<NaiveDate> {
    match now {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .context("Invalid --now date format (use YYYY-MM-DD)"),
        None => Ok(Local::now().date_naive()),
    }
}

/// Load every observation from the source and compute a report
pub async fn build_report(
    config_path: Option<&Path>,
    source: Option<&str>,
    now: Option<&str>,
) -> Result<AnalyticsReport> {
    let config = load_config(config_path)?;
    let source = require_source(source)?;
    let now = parse_now(now)?;

    let observations = source
        .load()
        .await
        .with_context(|| format!("Failed to load observations from {}", source))?;

    Ok(AnalyticsEngine::new(config).run(&observations, now))
}
