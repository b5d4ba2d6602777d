//! Insight Synthesizer - ranked, human-readable findings
//!
//! Turns computed statistics and cross-entity patterns into a short,
//! deterministic list of insights. Rules run in a fixed order and read only
//! the stats and patterns, never the raw timeline.
//!
//! ## Built-in Rules
//!
//! 1. **Overall leader** - highest total count (`comparison`)
//! 2. **Longest streak** - longest run of active days (`streak`)
//! 3. **Longest dry streak** - longest run of zero days, if any (`streak`)
//! 4. **Monthly leader** - highest current-month count (`peak`)
//! 5. **Busiest weekday** - weekday with the most activity (`pattern`)
//! 6. **Recent trend** - week-over-week change beyond the noise threshold
//!    (`pattern` or `anomaly`)
//! 7. **Zero days** - per-entity count of days without activity (`pattern`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadence_core::insights::{InsightContext, InsightSynthesizer};
//!
//! let synthesizer = InsightSynthesizer::new();
//! let ctx = InsightContext::new(&stats, &patterns, &config);
//! let insights = synthesizer.synthesize(&ctx);
//! ```

pub mod rules;
pub mod synthesizer;
pub mod types;

pub use rules::{
    BusiestWeekdayRule, DryStreakRule, MonthlyLeaderRule, OverallLeaderRule, RecentTrendRule,
    StreakLeaderRule, ZeroDaysRule,
};
pub use synthesizer::{InsightContext, InsightRule, InsightSynthesizer};
pub use types::{Insight, InsightKind};
