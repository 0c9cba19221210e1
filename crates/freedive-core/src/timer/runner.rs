//! Real-time driver for [`SessionMachine`].
//!
//! Each run is one tokio task that steps the machine on a fixed one-tick
//! schedule. Stopping cancels the run's token; the task checks it before
//! every event it delivers and while it waits, so nothing is emitted after
//! a stop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, Instrument};
use uuid::Uuid;

use super::cue::Cue;
use super::engine::{SessionMachine, SessionState, TICK_MS};
use crate::events::{SessionEvent, SessionSnapshot};
use crate::table::{Round, TableKind};

/// Receives a run's output. Called from the run's task, in emission order.
pub trait SessionObserver: Send + Sync {
    fn on_tick(&self, snapshot: &SessionSnapshot);
    fn on_cue(&self, cue: &Cue);
    /// Called at most once per run, and never for a cancelled run.
    fn on_completed(&self);
}

/// Run state shared by the timer and its task. `Running` leaves only
/// through a single transition, to `Completed` or `Cancelled`.
type Status = Arc<Mutex<SessionState>>;

fn lock(status: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Move `Running` to `next`. Returns `false` if the run already left
/// `Running`.
fn finish(status: &Mutex<SessionState>, next: SessionState) -> bool {
    let mut state = lock(status);
    if *state != SessionState::Running {
        return false;
    }
    *state = next;
    true
}

struct ActiveRun {
    run_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    status: Status,
}

/// Owns at most one running session.
pub struct SessionTimer {
    runtime: Handle,
    tick: Duration,
    /// State of the last run once it has been stopped.
    last_state: SessionState,
    active: Option<ActiveRun>,
}

impl SessionTimer {
    pub fn new(runtime: Handle) -> Self {
        Self::with_tick(runtime, Duration::from_millis(TICK_MS))
    }

    /// A timer whose ticks last `tick` of wall-clock time. The countdown
    /// still moves one second per tick.
    pub fn with_tick(runtime: Handle, tick: Duration) -> Self {
        Self {
            runtime,
            tick,
            last_state: SessionState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(run) => *lock(&run.status),
            None => self.last_state,
        }
    }

    /// Start a run over `rounds`, cancelling any run already in progress.
    pub fn start(
        &mut self,
        kind: TableKind,
        rounds: Vec<Round>,
        observer: Arc<dyn SessionObserver>,
    ) -> Uuid {
        self.stop();

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let machine = SessionMachine::new(kind, rounds);
        let span = tracing::info_span!("session", %run_id, kind = %kind);

        info!(%run_id, kind = %kind, rounds = machine.total_rounds(), "session started");
        let status: Status = Arc::new(Mutex::new(SessionState::Running));

        let handle = self.runtime.spawn(
            drive(
                machine,
                observer,
                cancel.clone(),
                self.tick,
                Arc::clone(&status),
            )
            .instrument(span),
        );

        self.active = Some(ActiveRun {
            run_id,
            cancel,
            handle,
            status,
        });
        run_id
    }

    /// Cancel the current run. Safe to call repeatedly; returns whether a run
    /// was actually stopped.
    pub fn stop(&mut self) -> bool {
        let Some(run) = self.active.take() else {
            return false;
        };
        run.cancel.cancel();
        let was_running = finish(&run.status, SessionState::Cancelled);
        self.last_state = *lock(&run.status);
        if was_running {
            info!(run_id = %run.run_id, "session cancelled");
        }
        if !run.handle.is_finished() {
            run.handle.abort();
        }
        was_running
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drive(
    mut machine: SessionMachine,
    observer: Arc<dyn SessionObserver>,
    cancel: CancellationToken,
    tick: Duration,
    status: Status,
) {
    let events = machine.start();
    if !dispatch(&events, observer.as_ref(), &cancel, &status) {
        return;
    }

    // Fixed schedule; observer time must not stretch the countdown.
    let mut ticks = tokio::time::interval_at(Instant::now() + tick, tick);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while machine.state() == SessionState::Running {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("session loop shutting down");
                return;
            }
            _ = ticks.tick() => {}
        }

        let events = machine.tick();
        if !dispatch(&events, observer.as_ref(), &cancel, &status) {
            return;
        }
    }
}

/// Deliver `events` in order. Returns `false` once the run has been
/// cancelled.
fn dispatch(
    events: &[SessionEvent],
    observer: &dyn SessionObserver,
    cancel: &CancellationToken,
    status: &Mutex<SessionState>,
) -> bool {
    for event in events {
        if cancel.is_cancelled() {
            return false;
        }
        match event {
            SessionEvent::Tick { snapshot } => {
                trace!(
                    round = snapshot.round_index,
                    phase = ?snapshot.phase,
                    remaining_ms = snapshot.remaining_ms,
                    "tick"
                );
                observer.on_tick(snapshot);
            }
            SessionEvent::Cue { cue } => observer.on_cue(cue),
            SessionEvent::Completed => {
                // A concurrent stop() may have won; it owns the outcome then.
                if !finish(status, SessionState::Completed) {
                    return false;
                }
                info!("session completed");
                observer.on_completed();
            }
        }
    }
    !cancel.is_cancelled()
}
