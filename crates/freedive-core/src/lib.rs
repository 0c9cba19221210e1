//! # freedive Core Library
//!
//! This library provides the session sequencing engine for freediving
//! breath-hold training: it builds CO2, O2 and one-breath tables and runs
//! guided countdown sessions over them. The `freedive` CLI is a thin
//! presentation layer over the same library.
//!
//! ## Architecture
//!
//! - **Tables**: pure generators mapping a few parameters to a list of rounds
//! - **Timer**: a pure per-second state machine plus a tokio driver that
//!   steps it in real time and can be cancelled at any tick
//! - **Controllers**: one per table kind; own parameters, rounds and the
//!   running session, and publish their state on a `watch` channel
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionMachine`]: Countdown state machine
//! - [`SessionTimer`]: Cancellable real-time driver
//! - [`SessionController`]: Per-table command surface
//! - [`Speaker`]: Speech capability the session talks through
//! - [`Config`]: Application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod format;
pub mod speech;
pub mod storage;
pub mod table;
pub mod timer;

pub use controller::{
    Co2Controller, Co2Params, ControllerState, O2Controller, O2Params, OneBreathController,
    OneBreathParams, Parameter, SessionController, TableParams,
};
pub use error::{ConfigError, CoreError, ParseError};
pub use events::{SessionEvent, SessionSnapshot};
pub use speech::{MutedSpeaker, Speaker, TranscriptSpeaker};
pub use storage::Config;
pub use table::{
    generate_co2_table, generate_o2_table, generate_one_breath_table, table_duration_ms, Round,
    SessionPhase, TableKind,
};
pub use timer::{Cue, SessionMachine, SessionObserver, SessionState, SessionTimer};
