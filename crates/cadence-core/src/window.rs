//! Analysis window calculation
//!
//! Derives the analysis range and the current week/month/year sub-windows
//! from the reconciled records and a reference date.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{AnalysisStartPolicy, AnalyticsConfig, WeekStartPolicy};
use crate::models::{DateRange, DayRecord};

/// The date range all statistics are computed over, with its sub-windows
///
/// Invariant: `start <= end`, and every sub-window start lies in
/// `[start, end]` except `month_start`, which is the calendar month start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub week_start: NaiveDate,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub year_start: NaiveDate,
}

impl AnalysisWindow {
    /// Compute the window, or `None` when there are no records
    pub fn compute(
        records: &[DayRecord],
        now: NaiveDate,
        config: &AnalyticsConfig,
    ) -> Option<Self> {
        let first = records.iter().map(|r| r.date).min()?;
        let latest = records.iter().map(|r| r.date).max()?;

        let mut end = now.min(latest);
        if let Some(cap) = config.hard_cap_end {
            end = end.min(cap);
        }

        let mut start = match config.analysis_start {
            AnalysisStartPolicy::Fixed(date) => date,
            AnalysisStartPolicy::FirstObservationMonth => month_start(first),
        };
        if start > end {
            warn!(%start, %end, "Analysis start is after window end, clamping to a single day");
            start = end;
        }

        let week_start = match config.week_start {
            WeekStartPolicy::CalendarMonday => monday_on_or_before(end),
            WeekStartPolicy::Rolling7Day => end - Duration::days(6),
        };

        Some(Self {
            start,
            end,
            week_start: week_start.max(start),
            month_start: month_start(end),
            month_end: month_end(end),
            year_start: year_start(end).max(start),
        })
    }

    /// Whether `date` falls inside `[start, end]`
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days in the window
    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Every calendar day in the window, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.succ_opt()).take_while(move |d| *d <= end)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// January 1 of the year containing `date`
pub fn year_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.ordinal0()))
}

/// Most recent Monday on or before `date`
pub fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
