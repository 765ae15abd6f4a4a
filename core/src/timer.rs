//! One-shot recovery timer
//!
//! Each armed cooldown runs on its own thread parked on a condition variable,
//! so cancelling wakes the thread immediately instead of leaving it asleep
//! until the deadline.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct Signal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Handle to an armed cooldown. Dropping it cancels the cooldown.
#[derive(Debug)]
pub(crate) struct RecoveryTimer {
    generation: u64,
    delay: Duration,
    signal: Arc<Signal>,
}

impl RecoveryTimer {
    /// Start a cooldown of `delay`; `on_fire` receives `generation` unless
    /// the timer is cancelled first.
    pub(crate) fn arm<F>(name: &str, generation: u64, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let signal = Arc::new(Signal::default());
        let waiter = Arc::clone(&signal);

        let spawned = thread::Builder::new()
            .name(format!("{name}-recovery"))
            .spawn(move || {
                let cancelled = waiter
                    .cancelled
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let (cancelled, _) = waiter
                    .wake
                    .wait_timeout_while(cancelled, delay, |cancelled| !*cancelled)
                    .unwrap_or_else(PoisonError::into_inner);
                if *cancelled {
                    return;
                }
                drop(cancelled);
                on_fire(generation);
            });

        if let Err(err) = spawned {
            tracing::error!(
                circuit = name,
                error = %err,
                "failed to spawn recovery timer, circuit stays open until closed"
            );
        }

        Self {
            generation,
            delay,
            signal,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn delay(&self) -> Duration {
        self.delay
    }

    pub(crate) fn cancel(&self) {
        let mut cancelled = self
            .signal
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.signal.wake.notify_all();
    }
}

impl Drop for RecoveryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
