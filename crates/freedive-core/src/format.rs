//! Time formatting and parsing for user-facing durations.

use crate::controller::Parameter;
use crate::error::ParseError;

/// `mm:ss`, minutes unbounded.
pub fn format_mmss(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Parse `90`, `90s` or `1:30` into milliseconds.
pub fn parse_duration_ms(input: &str) -> Result<u64, ParseError> {
    let err = || ParseError::Duration(input.to_string());
    let s = input.trim();

    let secs = if let Some((min, sec)) = s.split_once(':') {
        let min: u64 = min.trim().parse().map_err(|_| err())?;
        let sec: u64 = sec.trim().parse().map_err(|_| err())?;
        if sec >= 60 {
            return Err(err());
        }
        min.checked_mul(60).and_then(|m| m.checked_add(sec)).ok_or_else(err)?
    } else {
        let digits = s.strip_suffix('s').unwrap_or(s).trim();
        digits.parse::<u64>().map_err(|_| err())?
    };

    secs.checked_mul(1000).ok_or_else(err)
}

/// Parse `name=value` as used by `--param hold=1:30`.
pub fn parse_assignment(input: &str) -> Result<(Parameter, u64), ParseError> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::Assignment(input.to_string()))?;
    Ok((name.parse()?, parse_duration_ms(value)?))
}
