//! Analytics engine
//!
//! A pure function from `(observations, now, config)` to an
//! [`AnalyticsReport`]. No state is carried between runs, so the same inputs
//! always produce the same report.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalyticsConfig;
use crate::insights::{Insight, InsightContext, InsightSynthesizer};
use crate::models::{DateRange, DayRecord, Observation};
use crate::patterns::CrossEntityPatterns;
use crate::reconcile::reconcile;
use crate::stats::EntityStats;
use crate::timeline::build_timeline;
use crate::window::AnalysisWindow;

/// The complete result of one analytics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Zero-filled daily timeline over the analysis window
    pub data_points: Vec<DayRecord>,
    pub stats: EntityStats,
    pub insights: Vec<Insight>,
    /// Absent when there were no observations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub patterns: CrossEntityPatterns,
    /// The reference date the report was computed against
    pub generated_at: NaiveDate,
}

impl AnalyticsReport {
    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    synthesizer: Arc<InsightSynthesizer>,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            synthesizer: Arc::new(InsightSynthesizer::new()),
        }
    }

    /// Use a custom synthesizer (e.g. with extra registered rules)
    pub fn with_synthesizer(mut self, synthesizer: InsightSynthesizer) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run the full pipeline against the reference date `now`
    pub fn run(&self, observations: &[Observation], now: NaiveDate) -> AnalyticsReport {
        let records = reconcile(observations, now);
        let window = AnalysisWindow::compute(&records, now, &self.config);

        let timeline = match &window {
            Some(window) => build_timeline(&records, window),
            None => Vec::new(),
        };

        let stats = EntityStats::compute(&timeline, window.as_ref());
        let patterns = CrossEntityPatterns::analyze(&timeline, window.as_ref(), &self.config);
        let insights = self
            .synthesizer
            .synthesize(&InsightContext::new(&stats, &patterns, &self.config));

        info!(
            observations = observations.len(),
            days = timeline.len(),
            insights = insights.len(),
            start = ?window.map(|w| w.start),
            end = ?window.map(|w| w.end),
            "Analytics run complete"
        );

        AnalyticsReport {
            data_points: timeline,
            stats,
            insights,
            date_range: window.map(|w| w.date_range()),
            patterns,
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisStartPolicy;
    use crate::insights::InsightKind;
    use crate::models::Entity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_start(start: NaiveDate) -> AnalyticsEngine {
        AnalyticsEngine::new(AnalyticsConfig {
            analysis_start: AnalysisStartPolicy::Fixed(start),
            ..Default::default()
        })
    }

    #[test]
    fn test_end_to_end_scenario() {
        let obs = vec![
            Observation::new(date(2024, 1, 1), Entity::J, 2),
            Observation::new(date(2024, 1, 3), Entity::J, 2),
        ];
        let report = fixed_start(date(2024, 1, 1)).run(&obs, date(2024, 1, 3));

        assert_eq!(report.data_points.len(), 3);
        assert_eq!(report.data_points[1].count(Entity::J), 0);
        assert_eq!(report.stats.j.total_count, 4);
        assert_eq!(report.stats.j.longest_streak, 1);
        assert_eq!(report.stats.j.longest_zero_streak, 1);
        assert_eq!(report.stats.j.total_active_days, 2);
        assert_eq!(
            report.date_range,
            Some(DateRange {
                start: date(2024, 1, 1),
                end: date(2024, 1, 3)
            })
        );

        let first = &report.insights[0];
        assert_eq!(first.kind, InsightKind::Comparison);
        assert_eq!(first.entity, Some(Entity::J));
        assert_eq!(first.metric.as_deref(), Some("4 total"));
    }

    #[test]
    fn test_idempotent() {
        let obs = vec![
            Observation::new(date(2024, 2, 3), Entity::A, 5),
            Observation::new(date(2024, 2, 9), Entity::M, 1),
            Observation::new(date(2024, 2, 9), Entity::M, 2),
        ];
        let engine = AnalyticsEngine::default();
        let first = engine.run(&obs, date(2024, 2, 20));
        let second = engine.run(&obs, date(2024, 2, 20));

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_canonical_zero() {
        let report = AnalyticsEngine::default().run(&[], date(2024, 1, 1));

        assert!(report.is_empty());
        assert!(report.date_range.is_none());
        assert!(report.patterns.trend.is_none());
        assert_eq!(report.stats, EntityStats::empty());
        // Leader, streak, monthly leader, weekday and zero-days still render
        assert_eq!(report.insights.len(), 5);
        assert!(report.insights.iter().all(|i| i.kind != InsightKind::Anomaly));
    }

    #[test]
    fn test_leader_tie_break() {
        let obs = vec![
            Observation::new(date(2024, 1, 1), Entity::J, 100),
            Observation::new(date(2024, 1, 1), Entity::A, 100),
            Observation::new(date(2024, 1, 1), Entity::M, 50),
        ];
        let report = AnalyticsEngine::default().run(&obs, date(2024, 1, 1));
        assert_eq!(report.insights[0].entity, Some(Entity::J));
    }

    #[test]
    fn test_future_observations_excluded() {
        let obs = vec![
            Observation::new(date(2024, 1, 1), Entity::J, 1),
            Observation::new(date(2024, 1, 10), Entity::J, 50),
        ];
        let report = AnalyticsEngine::default().run(&obs, date(2024, 1, 5));

        assert_eq!(report.stats.j.total_count, 1);
        assert_eq!(report.date_range.unwrap().end, date(2024, 1, 1));
    }

    #[test]
    fn test_report_wire_format() {
        let obs = vec![Observation::new(date(2024, 1, 1), Entity::M, 3)];
        let report = AnalyticsEngine::default().run(&obs, date(2024, 1, 1));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["dataPoints"][0]["M"], 3);
        assert_eq!(json["stats"]["M"]["totalCount"], 3);
        assert_eq!(json["stats"]["M"]["person"], "M");
        assert_eq!(json["dateRange"]["start"], "2024-01-01");
        assert_eq!(json["generatedAt"], "2024-01-01");
        assert!(json["patterns"]["weekdayTotals"].is_array());
    }

    #[test]
    fn test_notable_trend_produces_insight() {
        // Mon 2024-01-01 .. Sun 2024-01-14, second week much busier
        let mut obs = Vec::new();
        for day in 1..=14u32 {
            let count = if day <= 7 { 1 } else { 5 };
            obs.push(Observation::new(date(2024, 1, day), Entity::A, count));
        }
        let report = fixed_start(date(2024, 1, 1)).run(&obs, date(2024, 1, 14));

        let trend = report.patterns.trend.as_ref().unwrap();
        assert_eq!(trend.delta, 28);
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Activity increasing recently"));
    }

    #[test]
    fn test_oversized_sheet_counts_do_not_panic() {
        let csv = "title\nDate,J,A,M\n2024-01-01,1e19,0,0\n2024-01-02,1e19,0,0\n";
        let obs = crate::import::parse_csv(csv.as_bytes(), None).unwrap();

        let report = AnalyticsEngine::default().run(&obs, date(2024, 1, 2));
        assert_eq!(report.stats.j.total_count, u64::MAX);
        assert_eq!(report.data_points.len(), 2);
    }

    struct StreakAlarm;

    impl crate::insights::InsightRule for StreakAlarm {
        fn name(&self) -> &'static str {
            "streak_alarm"
        }

        fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight> {
            let longest = ctx.stats.iter().map(|s| s.longest_streak).max()?;
            (longest >= 3).then(|| {
                Insight::new(InsightKind::Streak, "Long streak", "Someone kept going")
                    .with_metric(longest.to_string())
            })
        }
    }

    #[test]
    fn test_custom_synthesizer_rule_is_appended() {
        let mut synthesizer = InsightSynthesizer::new();
        synthesizer.register(Box::new(StreakAlarm));
        let engine = fixed_start(date(2024, 1, 1)).with_synthesizer(synthesizer);
        assert_eq!(
            engine.config().analysis_start,
            AnalysisStartPolicy::Fixed(date(2024, 1, 1))
        );

        let obs: Vec<_> = (1..=3u32)
            .map(|day| Observation::new(date(2024, 1, day), Entity::J, 1))
            .collect();
        let report = engine.run(&obs, date(2024, 1, 3));

        let last = report.insights.last().unwrap();
        assert_eq!(last.title, "Long streak");
        assert_eq!(last.metric.as_deref(), Some("3"));
        let builtin = AnalyticsEngine::default().run(&obs, date(2024, 1, 3));
        assert_eq!(report.insights.len(), builtin.insights.len() + 1);
    }
}
