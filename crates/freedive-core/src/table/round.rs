use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Which training table a round list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Co2,
    O2,
    OneBreath,
}

impl TableKind {
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Co2 => "CO2",
            TableKind::O2 => "O2",
            TableKind::OneBreath => "One-Breath",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TableKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "co2" => Ok(TableKind::Co2),
            "o2" => Ok(TableKind::O2),
            "one-breath" | "one_breath" | "onebreath" => Ok(TableKind::OneBreath),
            _ => Err(ParseError::TableKind(s.to_string())),
        }
    }
}

/// Half of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Breathing between holds.
    Recovery,
    Hold,
}

/// One training round. Immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Duration of the breathing/recovery phase in milliseconds.
    pub recovery_ms: u64,
    /// Duration of the breath-hold phase in milliseconds.
    pub hold_ms: u64,
}

impl Round {
    pub fn new(recovery_ms: u64, hold_ms: u64) -> Self {
        Self {
            recovery_ms,
            hold_ms,
        }
    }

    pub fn duration_of(&self, phase: SessionPhase) -> u64 {
        match phase {
            SessionPhase::Recovery => self.recovery_ms,
            SessionPhase::Hold => self.hold_ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.recovery_ms.saturating_add(self.hold_ms)
    }
}

/// Total playback length of a table in milliseconds.
pub fn table_duration_ms(rounds: &[Round]) -> u64 {
    rounds
        .iter()
        .fold(0u64, |acc, round| acc.saturating_add(round.total_ms()))
}
