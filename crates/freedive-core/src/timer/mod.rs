mod cue;
mod engine;
mod runner;

pub use cue::{Cue, COUNTDOWN_FROM_SECS, WARNING_SECS};
pub use engine::{phase_order, SessionMachine, SessionState, TICK_MS};
pub use runner::{SessionObserver, SessionTimer};
