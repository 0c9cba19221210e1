//! Table generators.
//!
//! Pure functions from a handful of parameters to an ordered list of
//! [`Round`]s. They never read controller state and never clamp: bounds are
//! the caller's business.

use super::round::Round;

/// Recovery added per round when walking a CO2 table from the last round up.
pub const CO2_RECOVERY_STEP_MS: u64 = 15_000;

/// CO2 table: constant hold, recovery shrinking by 15 s towards the last
/// round, which always gets 15 s.
pub fn generate_co2_table(round_count: usize, hold_ms: u64) -> Vec<Round> {
    (0..round_count)
        .map(|index| {
            let steps = (round_count - index) as u64;
            Round::new(steps.saturating_mul(CO2_RECOVERY_STEP_MS), hold_ms)
        })
        .collect()
}

/// Percent of the target hold for each round of an O2 table.
///
/// 6 to 10 rounds use hand-tuned progressions. Any other count spreads
/// evenly from 50% to 100%.
pub fn o2_percentages(round_count: usize) -> Vec<u64> {
    match round_count {
        6 => vec![50, 60, 70, 80, 90, 100],
        7 => vec![50, 60, 70, 80, 85, 90, 100],
        8 => vec![50, 60, 70, 80, 85, 90, 95, 100],
        9 => vec![50, 55, 60, 70, 75, 80, 85, 90, 100],
        10 => vec![50, 55, 60, 65, 70, 75, 80, 85, 90, 100],
        0 => Vec::new(),
        // A lone round is the target itself.
        1 => vec![100],
        n => {
            let last = (n - 1) as u64;
            (0..n as u64)
                .map(|i| (50 + i * 50 / last).min(100))
                .collect()
        }
    }
}

/// O2 table: constant recovery, hold climbing towards `target_hold_ms`.
pub fn generate_o2_table(round_count: usize, recovery_ms: u64, target_hold_ms: u64) -> Vec<Round> {
    o2_percentages(round_count)
        .into_iter()
        .map(|pct| Round::new(recovery_ms, target_hold_ms.saturating_mul(pct) / 100))
        .collect()
}

/// One-breath table: every round identical.
pub fn generate_one_breath_table(
    round_count: usize,
    hold_ms: u64,
    one_breath_ms: u64,
) -> Vec<Round> {
    vec![Round::new(one_breath_ms, hold_ms); round_count]
}
