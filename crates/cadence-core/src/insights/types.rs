//! Core types for the Insight Synthesizer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Entity;

/// Category of an insight, used by the dashboard to pick an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Peak,
    Streak,
    Comparison,
    Pattern,
    Anomaly,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Peak => "peak",
            InsightKind::Streak => "streak",
            InsightKind::Comparison => "comparison",
            InsightKind::Pattern => "pattern",
            InsightKind::Anomaly => "anomaly",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "peak" => Ok(InsightKind::Peak),
            "streak" => Ok(InsightKind::Streak),
            "comparison" => Ok(InsightKind::Comparison),
            "pattern" => Ok(InsightKind::Pattern),
            "anomaly" => Ok(InsightKind::Anomaly),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// A single human-readable finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(rename = "person", default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,
}

impl Insight {
    pub fn new(kind: InsightKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            metric: None,
            entity: None,
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn with_person(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }
}
