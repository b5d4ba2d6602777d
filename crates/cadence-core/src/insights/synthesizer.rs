//! Insight Synthesizer - runs the registered rules in order

use crate::config::AnalyticsConfig;
use crate::models::Entity;
use crate::patterns::CrossEntityPatterns;
use crate::stats::{EntityStats, PersonStats};

use super::rules::{
    BusiestWeekdayRule, DryStreakRule, MonthlyLeaderRule, OverallLeaderRule, RecentTrendRule,
    StreakLeaderRule, ZeroDaysRule,
};
use super::types::Insight;

/// Everything an insight rule is allowed to read
pub struct InsightContext<'a> {
    pub stats: &'a EntityStats,
    pub patterns: &'a CrossEntityPatterns,
    pub config: &'a AnalyticsConfig,
}

impl<'a> InsightContext<'a> {
    pub fn new(
        stats: &'a EntityStats,
        patterns: &'a CrossEntityPatterns,
        config: &'a AnalyticsConfig,
    ) -> Self {
        Self {
            stats,
            patterns,
            config,
        }
    }

    /// Entity with the largest metric; ties go to the first in J, A, M order
    ///
    /// Starts from `(J, 0)` and only moves on a strictly larger value, so an
    /// all-zero metric names J.
    pub fn leader<F>(&self, metric: F) -> (Entity, u64)
    where
        F: Fn(&PersonStats) -> u64,
    {
        self.stats
            .iter()
            .fold((Entity::J, 0), |(best, max), stats| {
                let value = metric(stats);
                if value > max {
                    (stats.entity, value)
                } else {
                    (best, max)
                }
            })
    }
}

/// A single insight rule
pub trait InsightRule: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Produce an insight, or `None` when the rule has nothing to say
    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<Insight>;
}

/// Runs insight rules in registration order
pub struct InsightSynthesizer {
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InsightSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("InsightSynthesizer")
            .field("rules", &names)
            .finish()
    }
}

impl InsightSynthesizer {
    /// Create a synthesizer with the built-in rules
    pub fn new() -> Self {
        let mut synthesizer = Self { rules: vec![] };

        // Order is part of the output contract
        synthesizer.register(Box::new(OverallLeaderRule));
        synthesizer.register(Box::new(StreakLeaderRule));
        synthesizer.register(Box::new(DryStreakRule));
        synthesizer.register(Box::new(MonthlyLeaderRule));
        synthesizer.register(Box::new(BusiestWeekdayRule));
        synthesizer.register(Box::new(RecentTrendRule));
        synthesizer.register(Box::new(ZeroDaysRule));

        synthesizer
    }

    /// Register an insight rule after the existing ones
    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule and collect the insights it produced
    pub fn synthesize(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let insights: Vec<Insight> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let insight = rule.evaluate(ctx);
                if insight.is_none() {
                    tracing::debug!(rule = rule.name(), "Insight rule produced nothing");
                }
                insight
            })
            .collect();

        tracing::debug!(count = insights.len(), "Insight synthesis complete");
        insights
    }
}
