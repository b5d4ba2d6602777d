//! Zero-filled daily timeline
//!
//! Streak and quiet-period detection need contiguous daily granularity, so
//! days without observations are materialized as explicit zero records.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DayRecord, Entity, EntityCounts};
use crate::window::AnalysisWindow;

/// Build exactly one record per day of the window, zero-filling gaps
pub fn build_timeline(records: &[DayRecord], window: &AnalysisWindow) -> Vec<DayRecord> {
    let mut by_date: BTreeMap<NaiveDate, EntityCounts> = BTreeMap::new();
    for record in records.iter().filter(|r| window.contains(r.date)) {
        by_date.entry(record.date).or_default().merge(&record.counts);
    }

    window
        .days()
        .map(|date| DayRecord::new(date, by_date.get(&date).copied().unwrap_or_default()))
        .collect()
}

/// One entity's daily counts, aligned with the timeline
pub fn series(timeline: &[DayRecord], entity: Entity) -> Vec<u64> {
    timeline.iter().map(|r| r.count(entity)).collect()
}

/// Sum of one entity's counts over `[from, to]` inclusive
pub fn sum_between(timeline: &[DayRecord], entity: Entity, from: NaiveDate, to: NaiveDate) -> u64 {
    let counts = timeline
        .iter()
        .filter(|r| r.date >= from && r.date <= to)
        .map(|r| r.count(entity));
    saturating_sum(counts)
}

/// Sum that clamps at `u64::MAX` instead of overflowing
pub fn saturating_sum<I: IntoIterator<Item = u64>>(counts: I) -> u64 {
    counts.into_iter().fold(0u64, |acc, c| acc.saturating_add(c))
}
