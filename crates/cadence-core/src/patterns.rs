//! Cross-entity patterns
//!
//! Weekday aggregation, pairwise correlation between entities and the
//! week-over-week trend, all computed over the zero-filled timeline.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::{AnalyticsConfig, WeekStartPolicy};
use crate::models::{DayRecord, Entity};
use crate::timeline::{saturating_sum, series};
use crate::window::AnalysisWindow;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// All-entity activity summed over one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayTotal {
    pub day: String,
    pub total: u64,
}

/// Pearson correlation between two entities' daily series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub first: Entity,
    pub second: Entity,
    pub coefficient: f64,
}

/// All-entity total of the most recent 7-day block against the one before
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDelta {
    pub recent_start: NaiveDate,
    pub recent_end: NaiveDate,
    pub recent_total: u64,
    pub previous_total: u64,
    pub delta: i64,
}

impl TrendDelta {
    /// Whether the change is larger than the noise threshold
    pub fn is_notable(&self, threshold: u64) -> bool {
        self.delta.unsigned_abs() > threshold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossEntityPatterns {
    /// Monday through Sunday
    pub weekday_totals: Vec<WeekdayTotal>,
    pub busiest_weekday: WeekdayTotal,
    pub correlations: Vec<Correlation>,
    pub trend: Option<TrendDelta>,
}

impl CrossEntityPatterns {
    pub fn analyze(
        timeline: &[DayRecord],
        window: Option<&AnalysisWindow>,
        config: &AnalyticsConfig,
    ) -> Self {
        let weekday_totals = weekday_totals(timeline);
        let busiest_weekday = busiest(&weekday_totals);

        let correlations = Entity::pairs()
            .into_iter()
            .map(|(first, second)| Correlation {
                first,
                second,
                coefficient: pearson(&series(timeline, first), &series(timeline, second)),
            })
            .collect();

        let trend = window.map(|w| trend_delta(timeline, w.end, config.week_start));

        Self {
            weekday_totals,
            busiest_weekday,
            correlations,
            trend,
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// All-entity totals per weekday, Monday first
pub fn weekday_totals(timeline: &[DayRecord]) -> Vec<WeekdayTotal> {
    let mut totals = [0u64; 7];
    for record in timeline {
        let idx = record.date.weekday().num_days_from_monday() as usize;
        totals[idx] = totals[idx].saturating_add(record.counts.total());
    }

    WEEKDAYS
        .iter()
        .zip(totals)
        .map(|(day, total)| WeekdayTotal {
            day: weekday_name(*day).to_string(),
            total,
        })
        .collect()
}

/// Largest weekday total; earliest weekday wins ties, Monday when all zero
fn busiest(totals: &[WeekdayTotal]) -> WeekdayTotal {
    totals
        .iter()
        .fold(None::<&WeekdayTotal>, |best, day| match best {
            Some(b) if day.total <= b.total => Some(b),
            _ => Some(day),
        })
        .cloned()
        .unwrap_or_else(|| WeekdayTotal {
            day: weekday_name(Weekday::Mon).to_string(),
            total: 0,
        })
}

/// Pearson correlation coefficient, 0.0 for empty or constant series
pub fn pearson(xs: &[u64], ys: &[u64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }

    let mean = |v: &[u64]| v[..n].iter().map(|x| *x as f64).sum::<f64>() / n as f64;
    let (mean_x, mean_y) = (mean(xs), mean(ys));

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = *x as f64 - mean_x;
        let dy = *y as f64 - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Last day of the most recent complete 7-day block ending on or before `end`
pub fn recent_block_end(end: NaiveDate, policy: WeekStartPolicy) -> NaiveDate {
    match policy {
        WeekStartPolicy::Rolling7Day => end,
        WeekStartPolicy::CalendarMonday => match end.weekday() {
            Weekday::Sun => end,
            day => end - Duration::days(i64::from(day.num_days_from_monday()) + 1),
        },
    }
}

/// Week-over-week change; days outside the timeline count as zero
pub fn trend_delta(timeline: &[DayRecord], end: NaiveDate, policy: WeekStartPolicy) -> TrendDelta {
    let recent_end = recent_block_end(end, policy);
    let recent_start = recent_end - Duration::days(6);
    let previous_start = recent_start - Duration::days(7);

    let total_between = |from: NaiveDate, to: NaiveDate| -> u64 {
        saturating_sum(
            timeline
                .iter()
                .filter(|r| r.date >= from && r.date <= to)
                .map(|r| r.counts.total()),
        )
    };

    let recent_total = total_between(recent_start, recent_end);
    let previous_total = total_between(previous_start, recent_start - Duration::days(1));

    TrendDelta {
        recent_start,
        recent_end,
        recent_total,
        previous_total,
        delta: clamp_i64(recent_total).saturating_sub(clamp_i64(previous_total)),
    }
}

fn clamp_i64(total: u64) -> i64 {
    i64::try_from(total).unwrap_or(i64::MAX)
}
