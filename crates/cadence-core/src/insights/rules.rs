//! Built-in insight rules

use crate::models::Entity;

use super::synthesizer::{InsightContext, InsightRule};
use super::types::{Insight, InsightKind};

/// Highest total count over the whole window
pub struct OverallLeaderRule;

impl InsightRule for OverallLeaderRule {
    fn name(&self) -> &'static str {
        "overall_leader"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let (entity, total) = ctx.leader(|s| s.total_count);
        Some(
            Insight::new(
                InsightKind::Comparison,
                format!("{} is the most active overall", entity),
                format!(
                    "With a total of {} across the entire period. This is the sum of daily \
                     counts for that person over the analysis window.",
                    total
                ),
            )
            .with_metric(format!("{} total", total))
            .with_person(entity),
        )
    }
}

/// Longest run of consecutive active days
pub struct StreakLeaderRule;

impl InsightRule for StreakLeaderRule {
    fn name(&self) -> &'static str {
        "streak_leader"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let (entity, days) = ctx.leader(|s| s.longest_streak as u64);
        Some(
            Insight::new(
                InsightKind::Streak,
                format!("{} has the longest streak", entity),
                format!(
                    "Maintained consistency for {} consecutive days. This is the longest run \
                     of days with at least one activity.",
                    days
                ),
            )
            .with_metric(format!("{} days", days))
            .with_person(entity),
        )
    }
}

/// Longest run of consecutive zero days, skipped when nobody had one
pub struct DryStreakRule;

impl InsightRule for DryStreakRule {
    fn name(&self) -> &'static str {
        "dry_streak"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let (entity, days) = ctx.leader(|s| s.longest_zero_streak as u64);
        if days == 0 {
            return None;
        }
        Some(
            Insight::new(
                InsightKind::Streak,
                format!("{} had the longest dry streak", entity),
                format!(
                    "A longest run of {} consecutive days with zero activity. This highlights \
                     the longest period of inactivity for that person.",
                    days
                ),
            )
            .with_metric(format!("{} days", days))
            .with_person(entity),
        )
    }
}

/// Highest count in the current calendar month
pub struct MonthlyLeaderRule;

impl InsightRule for MonthlyLeaderRule {
    fn name(&self) -> &'static str {
        "monthly_leader"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let (entity, count) = ctx.leader(|s| s.current_month);
        Some(
            Insight::new(
                InsightKind::Peak,
                format!("{} is leading this month", entity),
                format!(
                    "Most active in the current month with {} total. Counts are within the \
                     current month of the analysis window.",
                    count
                ),
            )
            .with_metric(format!("{} this month", count))
            .with_person(entity),
        )
    }
}

/// Weekday with the most combined activity
pub struct BusiestWeekdayRule;

impl InsightRule for BusiestWeekdayRule {
    fn name(&self) -> &'static str {
        "busiest_weekday"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let busiest = &ctx.patterns.busiest_weekday;
        Some(
            Insight::new(
                InsightKind::Pattern,
                format!("{}s are the most active", busiest.day),
                format!(
                    "Overall activity peaks on {}s across all individuals. Aggregated Monday \
                     to Sunday over the analysis window.",
                    busiest.day
                ),
            )
            .with_metric(format!("{} total", busiest.total)),
        )
    }
}

/// Week-over-week change beyond the noise threshold
pub struct RecentTrendRule;

impl InsightRule for RecentTrendRule {
    fn name(&self) -> &'static str {
        "recent_trend"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let trend = ctx.patterns.trend.as_ref()?;
        if !trend.is_notable(ctx.config.noise_threshold) {
            return None;
        }

        let increasing = trend.delta > 0;
        let (kind, title, verb) = if increasing {
            (InsightKind::Pattern, "Activity increasing recently", "increased")
        } else {
            (InsightKind::Anomaly, "Activity decreasing recently", "decreased")
        };
        let sign = if increasing { "+" } else { "" };

        Some(
            Insight::new(
                kind,
                title,
                format!(
                    "Overall activity {} by {} in the week ending {} compared to the \
                     previous week.",
                    verb,
                    trend.delta.unsigned_abs(),
                    trend.recent_end
                ),
            )
            .with_metric(format!("{}{}", sign, trend.delta)),
        )
    }
}

/// Days with no activity, per entity
pub struct ZeroDaysRule;

impl InsightRule for ZeroDaysRule {
    fn name(&self) -> &'static str {
        "zero_days"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
        let metric = Entity::ALL
            .iter()
            .map(|e| format!("{}:{}", e, ctx.stats.get(*e).zero_days))
            .collect::<Vec<_>>()
            .join(" ");

        Some(
            Insight::new(
                InsightKind::Pattern,
                "Days with zero activity",
                "Counts of calendar days with zero activity per person (within analysis window).",
            )
            .with_metric(metric),
        )
    }
}
