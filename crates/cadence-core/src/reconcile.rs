//! Observation reconciliation
//!
//! Merges observations from every source into one record per calendar day.
//! A date can legitimately appear in more than one sheet with partial
//! counts, so counts for the same `(date, entity)` are summed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DayRecord, EntityCounts, Observation};

/// Merge observations into unique-by-date records, ascending by date
///
/// Records dated after `today` are dropped: future-dated rows are
/// data-entry artifacts, never real activity.
pub fn reconcile(observations: &[Observation], today: NaiveDate) -> Vec<DayRecord> {
    let mut by_date: BTreeMap<NaiveDate, EntityCounts> = BTreeMap::new();
    for obs in observations {
        by_date.entry(obs.date).or_default().add(obs.entity, obs.count);
    }

    let unique = by_date.len();
    let records: Vec<DayRecord> = by_date
        .into_iter()
        .filter(|(date, _)| *date <= today)
        .map(|(date, counts)| DayRecord::new(date, counts))
        .collect();

    debug!(
        observations = observations.len(),
        unique_dates = unique,
        future_dropped = unique - records.len(),
        "Reconciled observations"
    );

    records
}
