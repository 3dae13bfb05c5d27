//! Built-in exam policies

use crate::core::models::GridShape;
use crate::core::scoring::TierTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exam type, fixing the default grid shape, tier table and whether
/// worst-tier schedules are dropped from the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Mid-semester exams: 4 days × 4 slots
    #[default]
    Midsem,
    /// End-semester exams: 7 days × 2 slots
    Endsem,
}

impl Policy {
    /// Default grid shape
    #[must_use]
    pub const fn shape(self) -> GridShape {
        match self {
            Self::Midsem => GridShape {
                days: 4,
                slots_per_day: 4,
            },
            Self::Endsem => GridShape {
                days: 7,
                slots_per_day: 2,
            },
        }
    }

    /// Tier table for a grid of the given day width. The policy's own table
    /// is used when the width matches its default shape.
    #[must_use]
    pub fn tiers_for(self, slots_per_day: usize) -> TierTable {
        match self {
            Self::Midsem if slots_per_day == 4 => TierTable::midsem(),
            Self::Endsem if slots_per_day == 2 => TierTable::endsem(),
            _ => TierTable::for_slots(slots_per_day),
        }
    }

    /// Whether schedules that still contain the worst tier are discarded.
    /// With two slots a day most rosters cannot avoid back-to-back exams, so
    /// end-semester schedules are ranked instead.
    #[must_use]
    pub const fn discards_worst_tier(self) -> bool {
        matches!(self, Self::Midsem)
    }

    /// Lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Midsem => "midsem",
            Self::Endsem => "endsem",
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "midsem" | "mid" => Ok(Self::Midsem),
            "endsem" | "end" => Ok(Self::Endsem),
            other => Err(format!("Unknown policy: {other} (expected midsem or endsem)")),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
