//! Speech capability.
//!
//! The session only ever says short cues ("Hold", "3", ...). Whoever
//! implements [`Speaker`] owns voices, locales and queueing; calls arrive
//! in the order the cues were emitted and are fire-and-forget.

use std::sync::{Mutex, PoisonError};

pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);
}

impl<F> Speaker for F
where
    F: Fn(&str) + Send + Sync,
{
    fn speak(&self, text: &str) {
        self(text)
    }
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn speak(&self, _text: &str) {}
}

/// Keeps a transcript of everything spoken.
#[derive(Debug, Default)]
pub struct TranscriptSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl TranscriptSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Speaker for TranscriptSpeaker {
    fn speak(&self, text: &str) {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}
