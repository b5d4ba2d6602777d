//! Cadence Core Library
//!
//! Shared functionality for the Cadence activity analytics tool:
//! - Observation ingestion from sheet exports (CSV, .xlsx, Google Sheets)
//! - Reconciliation of observations into a canonical daily timeline
//! - Analysis windows and per-entity statistics
//! - Cross-entity patterns (weekday totals, correlation, recent trend)
//! - Insight synthesis
//! - A swappable store for publishing the latest report

pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod insights;
pub mod models;
pub mod patterns;
pub mod reconcile;
pub mod source;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod window;

pub use config::{AnalysisStartPolicy, AnalyticsConfig, WeekStartPolicy};
pub use engine::{AnalyticsEngine, AnalyticsReport};
pub use error::{Error, Result};
pub use import::Layout;
pub use insights::{Insight, InsightKind, InsightSynthesizer};
pub use models::{DateRange, DayRecord, Entity, EntityCounts, Observation};
pub use patterns::{Correlation, CrossEntityPatterns, TrendDelta, WeekdayTotal};
pub use source::DataSource;
pub use stats::{EntityStats, PersonStats};
pub use store::{MemoryReportStore, ReportStore};
pub use window::AnalysisWindow;
