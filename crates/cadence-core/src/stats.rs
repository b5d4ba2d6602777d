//! Per-entity statistics
//!
//! Every metric is computed over the same zero-filled timeline. Computing
//! any of them over the sparse observation list would silently skip missing
//! days instead of treating them as zero-activity days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DayRecord, Entity};
use crate::timeline::{saturating_sum, series, sum_between};
use crate::window::AnalysisWindow;

/// Average number of days in a month
pub const DAYS_PER_MONTH: f64 = 30.436875;

/// Width of the sliding window used to find the quietest period
pub const QUIET_WINDOW_DAYS: usize = 7;

/// Derived statistics for one entity over the analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonStats {
    #[serde(rename = "person")]
    pub entity: Entity,
    pub current_week: u64,
    pub current_month: u64,
    pub year_total: u64,
    pub weekly_avg: f64,
    pub monthly_avg: f64,
    /// `None` only when there is no timeline at all
    pub peak_day: Option<NaiveDate>,
    pub peak_day_count: u64,
    pub longest_streak: usize,
    pub longest_zero_streak: usize,
    pub quietest_period_start: Option<NaiveDate>,
    pub total_active_days: usize,
    pub total_count: u64,
    pub zero_days: usize,
    pub total_days: usize,
}

impl PersonStats {
    /// All-zero stats for an empty observation set
    pub fn empty(entity: Entity) -> Self {
        Self {
            entity,
            current_week: 0,
            current_month: 0,
            year_total: 0,
            weekly_avg: 0.0,
            monthly_avg: 0.0,
            peak_day: None,
            peak_day_count: 0,
            longest_streak: 0,
            longest_zero_streak: 0,
            quietest_period_start: None,
            total_active_days: 0,
            total_count: 0,
            zero_days: 0,
            total_days: 0,
        }
    }

    /// Compute stats for one entity over a zero-filled timeline
    pub fn compute(entity: Entity, timeline: &[DayRecord], window: &AnalysisWindow) -> Self {
        let Some(first_day) = timeline.first().map(|r| r.date) else {
            return Self::empty(entity);
        };
        let counts = series(timeline, entity);

        let total_days = counts.len();
        let total_count = saturating_sum(counts.iter().copied());
        let total_active_days = counts.iter().filter(|c| **c > 0).count();

        let (peak_day, peak_day_count) = match peak(&counts) {
            Some((idx, count)) if count > 0 => (timeline[idx].date, count),
            _ => (first_day, 0),
        };

        let (longest_streak, longest_zero_streak) = streaks(&counts);

        let quietest_period_start = quietest_window(&counts, QUIET_WINDOW_DAYS)
            .map(|(offset, _)| timeline[offset].date)
            .unwrap_or(first_day);

        Self {
            entity,
            current_week: sum_between(timeline, entity, window.week_start, window.end),
            current_month: sum_between(timeline, entity, window.month_start, window.month_end),
            year_total: sum_between(timeline, entity, window.year_start, window.end),
            weekly_avg: average_per(total_count, total_days, 7.0),
            monthly_avg: average_per(total_count, total_days, DAYS_PER_MONTH),
            peak_day: Some(peak_day),
            peak_day_count,
            longest_streak,
            longest_zero_streak,
            quietest_period_start: Some(quietest_period_start),
            total_active_days,
            total_count,
            zero_days: total_days - total_active_days,
            total_days,
        }
    }
}

/// Stats for every entity, keyed the way the dashboard expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    #[serde(rename = "J")]
    pub j: PersonStats,
    #[serde(rename = "A")]
    pub a: PersonStats,
    #[serde(rename = "M")]
    pub m: PersonStats,
}

impl EntityStats {
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Entity) -> PersonStats,
    {
        Self {
            j: f(Entity::J),
            a: f(Entity::A),
            m: f(Entity::M),
        }
    }

    pub fn empty() -> Self {
        Self::from_fn(PersonStats::empty)
    }

    /// Compute stats for every entity; all-zero when there is no window
    pub fn compute(timeline: &[DayRecord], window: Option<&AnalysisWindow>) -> Self {
        match window {
            Some(window) => Self::from_fn(|e| PersonStats::compute(e, timeline, window)),
            None => Self::empty(),
        }
    }

    pub fn get(&self, entity: Entity) -> &PersonStats {
        match entity {
            Entity::J => &self.j,
            Entity::A => &self.a,
            Entity::M => &self.m,
        }
    }

    /// Stats in canonical entity order
    pub fn iter(&self) -> impl Iterator<Item = &PersonStats> {
        [&self.j, &self.a, &self.m].into_iter()
    }
}

fn average_per(total: u64, days: usize, period_days: f64) -> f64 {
    if days == 0 {
        return 0.0;
    }
    total as f64 / (days as f64 / period_days)
}

/// Index and value of the maximum count; the earliest index wins ties
pub fn peak(counts: &[u64]) -> Option<(usize, u64)> {
    let mut best: Option<(usize, u64)> = None;
    for (idx, &count) in counts.iter().enumerate() {
        match best {
            Some((_, max)) if count <= max => {}
            _ => best = Some((idx, count)),
        }
    }
    best
}

/// Longest run of active days and longest run of zero days, in one scan
pub fn streaks(counts: &[u64]) -> (usize, usize) {
    let (mut longest, mut current) = (0, 0);
    let (mut longest_zero, mut current_zero) = (0, 0);

    for &count in counts {
        if count > 0 {
            current += 1;
            current_zero = 0;
            longest = longest.max(current);
        } else {
            current_zero += 1;
            current = 0;
            longest_zero = longest_zero.max(current_zero);
        }
    }

    (longest, longest_zero)
}

/// Offset and sum of the minimum-sum window of `width` days
///
/// Every offset from 0 to `len - width` is considered; the earliest window
/// wins ties. Returns `None` when there are fewer than `width` days.
pub fn quietest_window(counts: &[u64], width: usize) -> Option<(usize, u64)> {
    if width == 0 || counts.len() < width {
        return None;
    }

    let mut best = (0, u64::MAX);
    for (offset, window) in counts.windows(width).enumerate() {
        let sum = saturating_sum(window.iter().copied());
        if offset == 0 || sum < best.1 {
            best = (offset, sum);
        }
    }
    Some(best)
}
