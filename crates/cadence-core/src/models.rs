//! Domain models for Cadence

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tracked subject whose daily activity is counted
///
/// Declaration order (J, A, M) is the canonical order used for iteration
/// and for breaking ties between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entity {
    J,
    A,
    M,
}

impl Entity {
    /// All entities in canonical order
    pub const ALL: [Entity; 3] = [Entity::J, Entity::A, Entity::M];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::J => "J",
            Entity::A => "A",
            Entity::M => "M",
        }
    }

    /// Every unordered pair of entities, in canonical order
    pub fn pairs() -> Vec<(Entity, Entity)> {
        let mut pairs = Vec::new();
        for (i, first) in Self::ALL.iter().enumerate() {
            for second in &Self::ALL[i + 1..] {
                pairs.push((*first, *second));
            }
        }
        pairs
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "J" => Ok(Entity::J),
            "A" => Ok(Entity::A),
            "M" => Ok(Entity::M),
            _ => Err(format!("Unknown entity: {} (valid: J, A, M)", s)),
        }
    }
}

/// A raw `(date, entity, count)` record from an upstream source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub entity: Entity,
    pub count: u64,
}

impl Observation {
    pub fn new(date: NaiveDate, entity: Entity, count: u64) -> Self {
        Self {
            date,
            entity,
            count,
        }
    }
}

/// Per-entity counts for a single day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    #[serde(rename = "J")]
    pub j: u64,
    #[serde(rename = "A")]
    pub a: u64,
    #[serde(rename = "M")]
    pub m: u64,
}

impl EntityCounts {
    pub fn new(j: u64, a: u64, m: u64) -> Self {
        Self { j, a, m }
    }

    pub fn get(&self, entity: Entity) -> u64 {
        match entity {
            Entity::J => self.j,
            Entity::A => self.a,
            Entity::M => self.m,
        }
    }

    /// Add to one entity's count (counts from separate sources combine)
    pub fn add(&mut self, entity: Entity, count: u64) {
        let slot = match entity {
            Entity::J => &mut self.j,
            Entity::A => &mut self.a,
            Entity::M => &mut self.m,
        };
        *slot = slot.saturating_add(count);
    }

    /// Add every entity's count from another day record
    pub fn merge(&mut self, other: &EntityCounts) {
        for entity in Entity::ALL {
            self.add(entity, other.get(entity));
        }
    }

    /// Sum across all entities
    pub fn total(&self) -> u64 {
        self.j.saturating_add(self.a).saturating_add(self.m)
    }
}

/// One calendar day with its per-entity counts
///
/// Serialized flat as `{ "date": "2024-01-01", "J": 2, "A": 0, "M": 1 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: EntityCounts,
}

impl DayRecord {
    pub fn new(date: NaiveDate, counts: EntityCounts) -> Self {
        Self { date, counts }
    }

    /// A day with no recorded activity
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            counts: EntityCounts::default(),
        }
    }

    pub fn count(&self, entity: Entity) -> u64 {
        self.counts.get(entity)
    }
}

/// Inclusive date range covered by a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
