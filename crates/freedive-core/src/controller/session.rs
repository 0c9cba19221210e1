//! Session controller.
//!
//! One controller per table kind. It owns the parameters, the generated
//! round list and at most one running session, and publishes all of it as a
//! [`ControllerState`] on a `watch` channel. Commands that are not allowed
//! right now (anything but `stop_session` while running, round counts past
//! their limits) are silently ignored and leave the state untouched; each
//! command returns whether it was applied.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

use super::params::{
    Co2Params, O2Params, OneBreathParams, Parameter, TableParams, DEFAULT_ROUNDS, MIN_ROUNDS,
};
use crate::events::SessionSnapshot;
use crate::speech::Speaker;
use crate::table::{table_duration_ms, Round, TableKind};
use crate::timer::{Cue, SessionObserver, SessionTimer, TICK_MS};

/// Everything the presentation layer renders for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState<P> {
    pub params: P,
    pub rounds: Vec<Round>,
    pub is_running: bool,
    pub latest_snapshot: Option<SessionSnapshot>,
    /// Wall-clock start of the running session.
    pub started_at: Option<DateTime<Utc>>,
}

impl<P> ControllerState<P> {
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn total_ms(&self) -> u64 {
        table_duration_ms(&self.rounds)
    }
}

pub type Co2Controller = SessionController<Co2Params>;
pub type O2Controller = SessionController<O2Params>;
pub type OneBreathController = SessionController<OneBreathParams>;

/// Run generation the controller currently listens to. Observers of older
/// runs find a different value and drop their events.
type ActiveRun = Arc<Mutex<Option<u64>>>;

pub struct SessionController<P: TableParams> {
    state: Arc<watch::Sender<ControllerState<P>>>,
    timer: SessionTimer,
    active_run: ActiveRun,
    generation: u64,
}

impl<P: TableParams> SessionController<P> {
    /// Controller with default parameters and [`DEFAULT_ROUNDS`] rounds.
    pub fn new(runtime: Handle) -> Self {
        Self::with_params(P::default(), DEFAULT_ROUNDS, runtime, Duration::from_millis(TICK_MS))
    }

    /// Parameters are clamped into bounds and `round_count` into the table's
    /// allowed range before the first table is generated.
    pub fn with_params(params: P, round_count: usize, runtime: Handle, tick: Duration) -> Self {
        let params = params.clamped();
        let round_count = clamp_round_count::<P>(round_count);
        let rounds = params.generate(round_count);
        let (state, _) = watch::channel(ControllerState {
            params,
            rounds,
            is_running: false,
            latest_snapshot: None,
            started_at: None,
        });
        Self {
            state: Arc::new(state),
            timer: SessionTimer::with_tick(runtime, tick),
            active_run: Arc::new(Mutex::new(None)),
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> TableKind {
        P::KIND
    }

    pub fn state(&self) -> ControllerState<P> {
        self.state.borrow().clone()
    }

    /// Receives every state change: mutations and per-second ticks.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState<P>> {
        self.state.subscribe()
    }

    pub fn params(&self) -> P {
        self.state.borrow().params.clone()
    }

    pub fn parameter(&self, parameter: Parameter) -> Option<u64> {
        self.state.borrow().params.get(parameter)
    }

    pub fn rounds(&self) -> Vec<Round> {
        self.state.borrow().rounds.clone()
    }

    pub fn round_count(&self) -> usize {
        self.state.borrow().rounds.len()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    pub fn latest_snapshot(&self) -> Option<SessionSnapshot> {
        self.state.borrow().latest_snapshot.clone()
    }

    // ── Table commands ───────────────────────────────────────────────

    pub fn set_parameter(&mut self, parameter: Parameter, value_ms: u64) -> bool {
        self.update_params("set_parameter", |params| params.set(parameter, value_ms))
    }

    pub fn adjust_parameter(&mut self, parameter: Parameter, delta_ms: i64) -> bool {
        self.update_params("adjust_parameter", |params| params.adjust(parameter, delta_ms))
    }

    pub fn add_round(&mut self) -> bool {
        self.update_round_count("add_round", |count| match P::MAX_ROUNDS {
            Some(max) if count >= max => None,
            _ => Some(count + 1),
        })
    }

    /// Drop one round. The table is regenerated from the new count, so
    /// `_index` does not pick which round goes.
    pub fn remove_round(&mut self, _index: usize) -> bool {
        self.update_round_count("remove_round", |count| {
            (count > MIN_ROUNDS).then(|| count - 1)
        })
    }

    // ── Session commands ─────────────────────────────────────────────

    /// Start a session over the current rounds. Ignored while one is
    /// running.
    ///
    /// `speaker` is called from the session task, never while the
    /// controller's run guard is held.
    pub fn start_session(&mut self, speaker: Arc<dyn Speaker>) -> bool {
        if self.is_running() {
            debug!(kind = %P::KIND, "start_session rejected: already running");
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        *lock(&self.active_run) = Some(generation);

        let rounds = {
            let mut rounds = Vec::new();
            self.state.send_modify(|state| {
                state.is_running = true;
                state.latest_snapshot = None;
                state.started_at = Some(Utc::now());
                rounds = state.rounds.clone();
            });
            rounds
        };

        let observer = Arc::new(ControllerObserver {
            state: Arc::clone(&self.state),
            active_run: Arc::clone(&self.active_run),
            generation,
            speaker,
        });
        self.timer.start(P::KIND, rounds, observer);
        true
    }

    /// Cancel any running session. Always safe; returns whether a session
    /// was running.
    pub fn stop_session(&mut self) -> bool {
        lock(&self.active_run).take();
        self.timer.stop();
        let was_running = self.state.send_if_modified(|state| {
            let changed = state.is_running || state.latest_snapshot.is_some();
            state.is_running = false;
            state.latest_snapshot = None;
            state.started_at = None;
            changed
        });
        if was_running {
            info!(kind = %P::KIND, "session stopped");
        }
        was_running
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn update_params(&mut self, op: &str, apply: impl FnOnce(&mut P) -> bool) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if state.is_running {
                return false;
            }
            let mut params = state.params.clone();
            if !apply(&mut params) {
                return false;
            }
            state.rounds = params.generate(state.rounds.len());
            state.params = params;
            true
        });
        log_outcome::<P>(op, applied, self.round_count());
        applied
    }

    fn update_round_count(&mut self, op: &str, next: impl FnOnce(usize) -> Option<usize>) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if state.is_running {
                return false;
            }
            match next(state.rounds.len()) {
                Some(count) => {
                    state.rounds = state.params.generate(count);
                    true
                }
                None => false,
            }
        });
        log_outcome::<P>(op, applied, self.round_count());
        applied
    }
}

impl<P: TableParams> Drop for SessionController<P> {
    fn drop(&mut self) {
        self.stop_session();
    }
}

fn clamp_round_count<P: TableParams>(round_count: usize) -> usize {
    let count = round_count.max(MIN_ROUNDS);
    match P::MAX_ROUNDS {
        Some(max) => count.min(max),
        None => count,
    }
}

fn log_outcome<P: TableParams>(op: &str, applied: bool, rounds: usize) {
    if applied {
        debug!(kind = %P::KIND, op, rounds, "table regenerated");
    } else {
        debug!(kind = %P::KIND, op, "command rejected");
    }
}

fn lock(active_run: &ActiveRun) -> std::sync::MutexGuard<'_, Option<u64>> {
    active_run.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ControllerObserver<P> {
    state: Arc<watch::Sender<ControllerState<P>>>,
    active_run: ActiveRun,
    generation: u64,
    speaker: Arc<dyn Speaker>,
}

impl<P: TableParams> ControllerObserver<P> {
    /// Guard check only; the lock is released before the caller speaks so a
    /// slow speaker never blocks `stop_session`.
    fn is_current(&self) -> bool {
        *lock(&self.active_run) == Some(self.generation)
    }
}

impl<P: TableParams> SessionObserver for ControllerObserver<P> {
    fn on_tick(&self, snapshot: &SessionSnapshot) {
        let active = lock(&self.active_run);
        if *active != Some(self.generation) {
            return;
        }
        self.state.send_modify(|state| {
            state.latest_snapshot = Some(snapshot.clone());
        });
    }

    fn on_cue(&self, cue: &Cue) {
        if self.is_current() {
            self.speaker.speak(&cue.text());
        }
    }

    fn on_completed(&self) {
        if !self.is_current() {
            return;
        }
        // Announced before subscribers can see the idle state.
        self.speaker.speak(&Cue::SessionComplete.text());

        // Re-checked: the run may have been stopped while speaking.
        let mut active = lock(&self.active_run);
        if *active != Some(self.generation) {
            return;
        }
        *active = None;
        self.state.send_modify(|state| {
            state.is_running = false;
            state.latest_snapshot = None;
            state.started_at = None;
        });
        info!(kind = %P::KIND, "session complete");
    }
}
