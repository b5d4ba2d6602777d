//! Source refresh
//!
//! Reloads observations from the configured source, runs the engine on a
//! blocking thread and publishes the new report. A failed refresh leaves the
//! previously published report in place.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use cadence_core::{AnalyticsEngine, DataSource, ReportStore};

/// When the report was last refreshed and when the next scheduled refresh is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub last_refresh: DateTime<Utc>,
    pub next_refresh: Option<DateTime<Utc>>,
}

impl RefreshStatus {
    /// Milliseconds until the next scheduled refresh; 0 when unscheduled or overdue
    pub fn millis_until_next(&self, now: DateTime<Utc>) -> i64 {
        self.next_refresh
            .map(|next| (next - now).num_milliseconds().max(0))
            .unwrap_or(0)
    }
}

/// Outcome of a successful refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub observations: usize,
    pub data_points: usize,
}

pub struct Refresher {
    source: Option<DataSource>,
    engine: AnalyticsEngine,
    store: Arc<dyn ReportStore>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
    next_refresh: RwLock<Option<DateTime<Utc>>>,
    /// Serializes refreshes so manual and scheduled runs never overlap
    running: Mutex<()>,
}

impl Refresher {
    pub fn new(
        source: Option<DataSource>,
        engine: AnalyticsEngine,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            source,
            engine,
            store,
            last_refresh: RwLock::new(None),
            next_refresh: RwLock::new(None),
            running: Mutex::new(()),
        }
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Current status, or `None` before the first successful refresh
    pub fn status(&self) -> Option<RefreshStatus> {
        let last = *self.last_refresh.read().unwrap_or_else(|e| e.into_inner());
        let next = *self.next_refresh.read().unwrap_or_else(|e| e.into_inner());
        last.map(|last_refresh| RefreshStatus {
            last_refresh,
            next_refresh: next,
        })
    }

    /// Record when the scheduler will next refresh
    pub fn set_next_refresh(&self, at: Option<DateTime<Utc>>) {
        *self.next_refresh.write().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Reload the source and publish a fresh report
    pub async fn refresh(&self) -> anyhow::Result<RefreshSummary> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| anyhow!("No data source configured"))?;

        let _guard = self.running.lock().await;

        let observations = source
            .load()
            .await
            .with_context(|| format!("Failed to load observations from {}", source))?;
        let observation_count = observations.len();

        let engine = self.engine.clone();
        let today = Local::now().date_naive();
        let report = tokio::task::spawn_blocking(move || engine.run(&observations, today))
            .await
            .context("Analytics run did not complete")?;

        let summary = RefreshSummary {
            observations: observation_count,
            data_points: report.data_points.len(),
        };
        self.store.set(report);
        *self.last_refresh.write().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());

        info!(
            source = %source,
            observations = summary.observations,
            data_points = summary.data_points,
            "Report refreshed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::MemoryReportStore;
    use std::io::Write;

    fn refresher(source: Option<DataSource>) -> Refresher {
        Refresher::new(
            source,
            AnalyticsEngine::default(),
            Arc::new(MemoryReportStore::new()),
        )
    }

    #[test]
    fn test_millis_until_next() {
        let now = Utc::now();
        let status = RefreshStatus {
            last_refresh: now,
            next_refresh: Some(now + chrono::Duration::minutes(2)),
        };
        assert_eq!(status.millis_until_next(now), 120_000);
        assert_eq!(
            status.millis_until_next(now + chrono::Duration::minutes(5)),
            0
        );

        let unscheduled = RefreshStatus {
            last_refresh: now,
            next_refresh: None,
        };
        assert_eq!(unscheduled.millis_until_next(now), 0);
    }

    #[tokio::test]
    async fn test_refresh_without_source_fails() {
        let refresher = refresher(None);
        assert!(refresher.refresh().await.is_err());
        assert!(refresher.status().is_none());
        assert!(refresher.store().get().is_none());
    }

    #[tokio::test]
    async fn test_refresh_publishes_report() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Log\nDate,J,A,M\n2024-01-01,1,0,0\n2024-01-03,0,2,0\n").unwrap();
        file.flush().unwrap();

        let refresher = refresher(Some(DataSource::File(file.path().to_path_buf())));
        let summary = refresher.refresh().await.unwrap();

        assert_eq!(summary.observations, 6);
        assert_eq!(summary.data_points, 3);
        assert!(refresher.status().is_some());
        assert_eq!(refresher.store().get().unwrap().stats.a.total_count, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "Log\nDate,J,A,M\n2024-01-01,4,0,0\n").unwrap();

        let refresher = refresher(Some(DataSource::File(path.clone())));
        refresher.refresh().await.unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(refresher.refresh().await.is_err());
        assert_eq!(refresher.store().get().unwrap().stats.j.total_count, 4);
    }
}
