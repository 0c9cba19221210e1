use serde::{Deserialize, Serialize};

use crate::table::{SessionPhase, TableKind};
use crate::timer::Cue;

/// Where a running session stands, emitted once per elapsed second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub table_kind: TableKind,
    /// 0-based.
    pub round_index: usize,
    pub total_rounds: usize,
    pub phase: SessionPhase,
    /// Always positive; no snapshot is emitted for 0.
    pub remaining_ms: u64,
    pub is_running: bool,
}

/// Everything a session run produces, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Something to say out loud.
    Cue { cue: Cue },
    Tick { snapshot: SessionSnapshot },
    /// Every round finished without cancellation.
    Completed,
}

impl SessionEvent {
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            SessionEvent::Tick { snapshot } => Some(snapshot),
            _ => None,
        }
    }

    pub fn cue(&self) -> Option<&Cue> {
        match self {
            SessionEvent::Cue { cue } => Some(cue),
            _ => None,
        }
    }
}
