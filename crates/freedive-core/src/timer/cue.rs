use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::SessionPhase;

/// Seconds-left mark that gets its own warning.
pub const WARNING_SECS: u64 = 15;
/// Highest second announced by the verbal countdown.
pub const COUNTDOWN_FROM_SECS: u64 = 10;

/// A speech cue. [`Cue::text`] is what gets handed to the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    PhaseStart { phase: SessionPhase },
    FifteenSeconds { phase: SessionPhase },
    Countdown { seconds: u64 },
    SessionComplete,
}

impl Cue {
    /// Cues owed for a tick with `remaining_ms` left in `phase`, in the order
    /// they must be spoken.
    pub fn for_second(phase: SessionPhase, remaining_ms: u64) -> Vec<Cue> {
        let secs = remaining_ms / 1000;
        let mut cues = Vec::new();
        if secs == WARNING_SECS {
            cues.push(Cue::FifteenSeconds { phase });
        }
        if (1..=COUNTDOWN_FROM_SECS).contains(&secs) {
            cues.push(Cue::Countdown { seconds: secs });
        }
        cues
    }

    pub fn text(&self) -> String {
        match self {
            Cue::PhaseStart {
                phase: SessionPhase::Recovery,
            } => "Breath".to_string(),
            Cue::PhaseStart {
                phase: SessionPhase::Hold,
            } => "Hold".to_string(),
            Cue::FifteenSeconds {
                phase: SessionPhase::Recovery,
            } => "15 seconds, ready".to_string(),
            Cue::FifteenSeconds {
                phase: SessionPhase::Hold,
            } => "15 seconds remain".to_string(),
            Cue::Countdown { seconds } => seconds.to_string(),
            Cue::SessionComplete => "Session complete".to_string(),
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names() {
        let breath = Cue::PhaseStart {
            phase: SessionPhase::Recovery,
        };
        let hold = Cue::PhaseStart {
            phase: SessionPhase::Hold,
        };
        assert_eq!(breath.text(), "Breath");
        assert_eq!(hold.text(), "Hold");
        assert_eq!(Cue::SessionComplete.to_string(), "Session complete");
    }

    #[test]
    fn fifteen_second_warning_depends_on_phase() {
        assert_eq!(
            Cue::for_second(SessionPhase::Recovery, 15_000)[0].text(),
            "15 seconds, ready"
        );
        assert_eq!(
            Cue::for_second(SessionPhase::Hold, 15_000)[0].text(),
            "15 seconds remain"
        );
    }

    #[test]
    fn countdown_covers_ten_to_one() {
        assert!(Cue::for_second(SessionPhase::Hold, 11_000).is_empty());
        for secs in 1..=10 {
            let cues = Cue::for_second(SessionPhase::Hold, secs * 1000);
            assert_eq!(cues, vec![Cue::Countdown { seconds: secs }]);
        }
    }

    #[test]
    fn partial_seconds_truncate() {
        assert_eq!(
            Cue::for_second(SessionPhase::Recovery, 15_999).len(),
            1
        );
        assert!(Cue::for_second(SessionPhase::Recovery, 500).is_empty());
    }
}
