//! Session state machine.
//!
//! The machine is pure: it has no clock and no threads. The caller invokes
//! `start()` once and then `tick()` every time one tick (one second of
//! countdown) has elapsed; each call returns the events produced up to the
//! next wait point. [`super::SessionTimer`] drives it in real time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Completed | Cancelled)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut machine = SessionMachine::new(TableKind::Co2, rounds);
//! let mut events = machine.start();
//! while machine.state() == SessionState::Running {
//!     // wait one second
//!     events = machine.tick();
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::cue::Cue;
use crate::events::{SessionEvent, SessionSnapshot};
use crate::table::{Round, SessionPhase, TableKind};

/// Milliseconds taken off the countdown per tick.
pub const TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Order in which a round's two phases are played.
pub fn phase_order(kind: TableKind) -> [SessionPhase; 2] {
    match kind {
        TableKind::Co2 | TableKind::O2 => [SessionPhase::Recovery, SessionPhase::Hold],
        // Hold first, then the single recovery breath.
        TableKind::OneBreath => [SessionPhase::Hold, SessionPhase::Recovery],
    }
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    kind: TableKind,
    rounds: Vec<Round>,
    state: SessionState,
    round_index: usize,
    /// Index into `phase_order(kind)`.
    phase_slot: usize,
    remaining_ms: u64,
}

impl SessionMachine {
    pub fn new(kind: TableKind, rounds: Vec<Round>) -> Self {
        Self {
            kind,
            rounds,
            state: SessionState::Idle,
            round_index: 0,
            phase_slot: 0,
            remaining_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn phase(&self) -> SessionPhase {
        phase_order(self.kind)[self.phase_slot]
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Current position, or `None` unless running.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        if self.state != SessionState::Running {
            return None;
        }
        Some(SessionSnapshot {
            table_kind: self.kind,
            round_index: self.round_index,
            total_rounds: self.rounds.len(),
            phase: self.phase(),
            remaining_ms: self.remaining_ms,
            is_running: true,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter the first phase. Only valid from `Idle`; otherwise a no-op.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Idle {
            return events;
        }
        self.state = SessionState::Running;
        self.round_index = 0;
        self.phase_slot = 0;
        self.enter_phase(&mut events);
        events
    }

    /// One tick has elapsed. No-op unless running.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Running {
            return events;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(TICK_MS);
        if self.remaining_ms > 0 {
            self.emit_second(&mut events);
        } else {
            self.advance_phase();
            self.enter_phase(&mut events);
        }
        events
    }

    /// Abandon the run. Returns `false` if it had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }
        self.state = SessionState::Cancelled;
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Announce the current phase and emit its first second. Zero-length
    /// phases are announced and skipped; running past the last round
    /// completes the session.
    fn enter_phase(&mut self, events: &mut Vec<SessionEvent>) {
        loop {
            let Some(round) = self.rounds.get(self.round_index) else {
                self.state = SessionState::Completed;
                self.remaining_ms = 0;
                events.push(SessionEvent::Completed);
                return;
            };
            let phase = self.phase();
            self.remaining_ms = round.duration_of(phase);
            events.push(SessionEvent::Cue {
                cue: Cue::PhaseStart { phase },
            });
            if self.remaining_ms > 0 {
                self.emit_second(events);
                return;
            }
            self.advance_phase();
        }
    }

    fn emit_second(&self, events: &mut Vec<SessionEvent>) {
        if let Some(snapshot) = self.snapshot() {
            let phase = snapshot.phase;
            events.push(SessionEvent::Tick { snapshot });
            events.extend(
                Cue::for_second(phase, self.remaining_ms)
                    .into_iter()
                    .map(|cue| SessionEvent::Cue { cue }),
            );
        }
    }

    fn advance_phase(&mut self) {
        self.phase_slot += 1;
        if self.phase_slot == 2 {
            self.phase_slot = 0;
            self.round_index += 1;
        }
    }
}
