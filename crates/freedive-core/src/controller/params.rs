//! Per-table parameters and their bounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::table::{
    generate_co2_table, generate_o2_table, generate_one_breath_table, Round, TableKind,
};

/// Fewest rounds a table can be trimmed down to.
pub const MIN_ROUNDS: usize = 6;
/// Round count every controller starts with.
pub const DEFAULT_ROUNDS: usize = 8;
/// One-breath tables stop growing here.
pub const ONE_BREATH_MAX_ROUNDS: usize = 12;

/// Name of a user-adjustable table parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// CO2: shortest recovery.
    MinRecovery,
    /// CO2 and One-Breath: hold per round.
    Hold,
    /// O2: recovery per round.
    Recovery,
    /// O2: hold of the final round.
    TargetHold,
    /// One-Breath: the single recovery breath.
    OneBreath,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::MinRecovery => "min-recovery",
            Parameter::Hold => "hold",
            Parameter::Recovery => "recovery",
            Parameter::TargetHold => "target-hold",
            Parameter::OneBreath => "one-breath",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "min-recovery" => Ok(Parameter::MinRecovery),
            "hold" => Ok(Parameter::Hold),
            "recovery" | "breath" => Ok(Parameter::Recovery),
            "target-hold" | "target" => Ok(Parameter::TargetHold),
            "one-breath" => Ok(Parameter::OneBreath),
            _ => Err(ParseError::Parameter(s.to_string())),
        }
    }
}

/// Inclusive range a parameter is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_ms: u64,
    pub max_ms: Option<u64>,
}

impl Bounds {
    pub const fn at_least(min_ms: u64) -> Self {
        Self { min_ms, max_ms: None }
    }

    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: Some(max_ms),
        }
    }

    pub fn clamp(&self, value_ms: u64) -> u64 {
        let value = value_ms.max(self.min_ms);
        match self.max_ms {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Parameters of one table kind.
///
/// Implementations clamp on every write and regenerate nothing themselves;
/// the controller owns the round list.
pub trait TableParams:
    fmt::Debug + Clone + PartialEq + Default + Serialize + Send + Sync + 'static
{
    const KIND: TableKind;
    /// Highest round count `add_round` may reach, if any.
    const MAX_ROUNDS: Option<usize> = None;

    /// Parameters this table understands, in display order.
    fn parameters() -> &'static [Parameter];

    fn bounds(parameter: Parameter) -> Option<Bounds>;

    fn get(&self, parameter: Parameter) -> Option<u64>;

    /// Write the raw field. Only called with already clamped values.
    fn store(&mut self, parameter: Parameter, value_ms: u64);

    fn generate(&self, round_count: usize) -> Vec<Round>;

    /// Clamp and store. Returns `false` for parameters of another table.
    fn set(&mut self, parameter: Parameter, value_ms: u64) -> bool {
        match Self::bounds(parameter) {
            Some(bounds) => {
                self.store(parameter, bounds.clamp(value_ms));
                true
            }
            None => false,
        }
    }

    /// Shift by `delta_ms`, then clamp.
    fn adjust(&mut self, parameter: Parameter, delta_ms: i64) -> bool {
        match self.get(parameter) {
            Some(current) => self.set(parameter, current.saturating_add_signed(delta_ms)),
            None => false,
        }
    }

    /// Copy of `self` with every field forced into bounds.
    fn clamped(&self) -> Self {
        let mut params = self.clone();
        for &parameter in Self::parameters() {
            if let Some(value) = self.get(parameter) {
                params.set(parameter, value);
            }
        }
        params
    }
}

// ── CO2 ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Co2Params {
    pub min_recovery_ms: u64,
    pub hold_ms: u64,
}

impl Default for Co2Params {
    fn default() -> Self {
        Self {
            min_recovery_ms: 15_000,
            hold_ms: 60_000,
        }
    }
}

impl TableParams for Co2Params {
    const KIND: TableKind = TableKind::Co2;

    fn parameters() -> &'static [Parameter] {
        &[Parameter::Hold, Parameter::MinRecovery]
    }

    fn bounds(parameter: Parameter) -> Option<Bounds> {
        match parameter {
            Parameter::MinRecovery => Some(Bounds::between(10_000, 60_000)),
            Parameter::Hold => Some(Bounds::at_least(15_000)),
            _ => None,
        }
    }

    fn get(&self, parameter: Parameter) -> Option<u64> {
        match parameter {
            Parameter::MinRecovery => Some(self.min_recovery_ms),
            Parameter::Hold => Some(self.hold_ms),
            _ => None,
        }
    }

    fn store(&mut self, parameter: Parameter, value_ms: u64) {
        match parameter {
            Parameter::MinRecovery => self.min_recovery_ms = value_ms,
            Parameter::Hold => self.hold_ms = value_ms,
            _ => {}
        }
    }

    fn generate(&self, round_count: usize) -> Vec<Round> {
        generate_co2_table(round_count, self.hold_ms)
    }
}

// ── O2 ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct O2Params {
    pub recovery_ms: u64,
    pub target_hold_ms: u64,
}

impl Default for O2Params {
    fn default() -> Self {
        Self {
            recovery_ms: 120_000,
            target_hold_ms: 180_000,
        }
    }
}

impl TableParams for O2Params {
    const KIND: TableKind = TableKind::O2;

    fn parameters() -> &'static [Parameter] {
        &[Parameter::Recovery, Parameter::TargetHold]
    }

    fn bounds(parameter: Parameter) -> Option<Bounds> {
        match parameter {
            Parameter::Recovery | Parameter::TargetHold => Some(Bounds::at_least(15_000)),
            _ => None,
        }
    }

    fn get(&self, parameter: Parameter) -> Option<u64> {
        match parameter {
            Parameter::Recovery => Some(self.recovery_ms),
            Parameter::TargetHold => Some(self.target_hold_ms),
            _ => None,
        }
    }

    fn store(&mut self, parameter: Parameter, value_ms: u64) {
        match parameter {
            Parameter::Recovery => self.recovery_ms = value_ms,
            Parameter::TargetHold => self.target_hold_ms = value_ms,
            _ => {}
        }
    }

    fn generate(&self, round_count: usize) -> Vec<Round> {
        generate_o2_table(round_count, self.recovery_ms, self.target_hold_ms)
    }
}

// ── One-Breath ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneBreathParams {
    pub hold_ms: u64,
    pub one_breath_ms: u64,
}

impl Default for OneBreathParams {
    fn default() -> Self {
        Self {
            hold_ms: 60_000,
            one_breath_ms: 6_000,
        }
    }
}

impl TableParams for OneBreathParams {
    const KIND: TableKind = TableKind::OneBreath;
    const MAX_ROUNDS: Option<usize> = Some(ONE_BREATH_MAX_ROUNDS);

    fn parameters() -> &'static [Parameter] {
        &[Parameter::Hold, Parameter::OneBreath]
    }

    fn bounds(parameter: Parameter) -> Option<Bounds> {
        match parameter {
            Parameter::Hold => Some(Bounds::at_least(15_000)),
            Parameter::OneBreath => Some(Bounds::between(3_000, 10_000)),
            _ => None,
        }
    }

    fn get(&self, parameter: Parameter) -> Option<u64> {
        match parameter {
            Parameter::Hold => Some(self.hold_ms),
            Parameter::OneBreath => Some(self.one_breath_ms),
            _ => None,
        }
    }

    fn store(&mut self, parameter: Parameter, value_ms: u64) {
        match parameter {
            Parameter::Hold => self.hold_ms = value_ms,
            Parameter::OneBreath => self.one_breath_ms = value_ms,
            _ => {}
        }
    }

    fn generate(&self, round_count: usize) -> Vec<Round> {
        generate_one_breath_table(round_count, self.hold_ms, self.one_breath_ms)
    }
}
