//! Stopping the watch loop from another thread

use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Why watching stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl+C, from the signal handler or the terminal
    Interrupted,
    /// Esc or q in the terminal
    QuitKey,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Interrupted => "interrupted",
            StopReason::QuitKey => "quit key",
        })
    }
}

/// A one-shot stop request that poll and retry delays can wait on.
///
/// Once triggered it stays triggered; the first reason is kept.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    reason: Mutex<Option<StopReason>>,
    changed: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self, reason: StopReason) {
        let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(reason);
        self.changed.notify_all();
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.reason.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_shutdown(&self) -> bool {
        self.reason().is_some()
    }

    /// Sleep for `duration`, waking early on a stop request.
    ///
    /// Returns `true` if a stop was requested.
    pub fn wait(&self, duration: Duration) -> bool {
        let slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        let (slot, _) = self
            .changed
            .wait_timeout_while(slot, duration, |reason| reason.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.is_some()
    }
}
