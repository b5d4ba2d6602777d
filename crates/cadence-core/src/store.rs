//! Published report store
//!
//! Holds the most recent [`AnalyticsReport`]. Writers build the report
//! outside the store and swap it in whole, so readers always see either the
//! previous report or the new one.

use std::sync::{Arc, RwLock};

use crate::engine::AnalyticsReport;

/// Storage for the latest published report
pub trait ReportStore: Send + Sync {
    /// The current report, if one has been published
    fn get(&self) -> Option<Arc<AnalyticsReport>>;

    /// Replace the current report
    fn set(&self, report: AnalyticsReport);
}

/// In-memory single-slot store
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    slot: RwLock<Option<Arc<AnalyticsReport>>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn get(&self) -> Option<Arc<AnalyticsReport>> {
        // A poisoned lock still holds a complete report
        let guard = self.slot.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    fn set(&self, report: AnalyticsReport) {
        let report = Arc::new(report);
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(report);
    }
}
