//! Shared primitive types used across the entire simulator.

use serde::{Deserialize, Serialize};

/// The canonical session identifier, e.g. `DR_1754400000000`.
pub type SessionId = String;

/// A stable persona identifier from the persona catalog.
pub type PersonaId = String;

/// A monotonic id assigned to every journal entry within a session.
pub type LogId = u64;

/// Simulated milliseconds since session start.
pub type SimMillis = u64;

/// Customer value segment. Bounds incentive offers and scoring multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    T1,
    T2,
}

impl Tier {
    /// Lead-score multiplier for this tier.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::T1 => 1.5,
            Self::T2 => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T1" | "t1" => Ok(Self::T1),
            "T2" | "t2" => Ok(Self::T2),
            other => Err(crate::error::SimError::UnknownTier {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
