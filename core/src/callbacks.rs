//! Observers for circuit state transitions
//!
//! Hooks run once the transition is committed and the machine lock has been
//! released, so a hook may read the breaker (`state()`, `fails()`) without
//! deadlocking. They run on whichever thread caused the transition: the
//! caller's thread for a trip from `call()` or a forced `open()`/`close()`,
//! and the recovery timer thread for half-open entry and for the close or
//! re-open that follows the recovery call. A slow hook delays that thread,
//! not the breaker's other callers.

use std::sync::Arc;

/// Observer receiving the circuit name
pub type TransitionHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Hooks registered through the builder, fired before the operation's own
/// `on_open`/`on_close` notifications
#[derive(Clone, Default)]
pub struct Callbacks {
    /// Circuit entered Open (threshold reached, forced, or recovery failed)
    pub on_open: Option<TransitionHook>,
    /// Circuit entered Closed from Open or HalfOpen; a `close()` on an
    /// already closed circuit does not fire it
    pub on_close: Option<TransitionHook>,
    /// Cooldown elapsed and the recovery call is about to run
    pub on_half_open: Option<TransitionHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger_open(&self, circuit: &str) {
        if let Some(ref callback) = self.on_open {
            callback(circuit);
        }
    }

    pub fn trigger_close(&self, circuit: &str) {
        if let Some(ref callback) = self.on_close {
            callback(circuit);
        }
    }

    pub fn trigger_half_open(&self, circuit: &str) {
        if let Some(ref callback) = self.on_half_open {
            callback(circuit);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .finish()
    }
}
