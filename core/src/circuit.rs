//! Circuit breaker implementation using state machines
//!
//! The breaker is a cheap handle over shared state. Every field is its own
//! synchronized cell: the state machine sits behind a mutex, the counters are
//! atomics, and the last successful arguments and the recovery timer each
//! have their own lock. A compound step such as "check state, run the
//! operation, count the outcome" is therefore not atomic end to end, but
//! transitions and timer arming always happen together under the machine
//! lock, so a timer is armed exactly while the circuit is Open.

use crate::{
    BreakerState,
    callbacks::Callbacks,
    errors::CircuitError,
    operation::Operation,
    timer::RecoveryTimer,
};
use state_machines::state_machine;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Name given to circuits built without an explicit one
pub const DEFAULT_NAME: &str = "circuit";

/// Circuit breaker configuration, fixed once the breaker is built
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Config {
    /// Consecutive failures that trip the circuit. Zero trips on the first failure.
    pub max_fails: usize,

    /// Cooldown between tripping and the recovery probe
    pub timeout: Duration,

    /// Jitter factor for the cooldown (0.0 = no jitter, 1.0 = full jitter)
    /// Uses chrono-machines formula: timeout * (1 - jitter + rand * jitter)
    pub jitter_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_fails: 5,
            timeout: Duration::from_secs(1),
            jitter_factor: 0.0,
        }
    }
}

/// Data shared by every state of the machine
#[derive(Debug, Clone)]
pub struct CircuitContext {
    pub name: String,
    pub config: Config,
}

impl Default for CircuitContext {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            config: Config::default(),
        }
    }
}

/// Data specific to the Open state
#[derive(Debug, Clone, Default)]
pub struct OpenData {
    pub opened_at: Option<Instant>,
}

state_machine! {
    name: Circuit,
    context: CircuitContext,
    dynamic: true,

    initial: Closed,
    states: [
        Closed,
        Open(OpenData),
        HalfOpen,
    ],
    events {
        trip {
            transition: { from: [Closed, HalfOpen], to: Open }
        }
        attempt_reset {
            transition: { from: Open, to: HalfOpen }
        }
        close {
            transition: { from: [Open, HalfOpen], to: Closed }
        }
    }
}

struct Shared<O: Operation> {
    context: CircuitContext,
    operation: Option<O>,
    callbacks: Callbacks,
    machine: Mutex<DynamicCircuit>,
    calls: AtomicU64,
    fails: AtomicUsize,
    last_success: Mutex<Option<O::Args>>,
    timer: Mutex<Option<RecoveryTimer>>,
    generation: AtomicU64,
}

impl<O: Operation> Shared<O> {
    fn machine(&self) -> MutexGuard<'_, DynamicCircuit> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, Option<RecoveryTimer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn last_success(&self) -> MutexGuard<'_, Option<O::Args>> {
        self.last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> &str {
        &self.context.name
    }

    fn state(&self) -> BreakerState {
        BreakerState::from_name(self.machine().current_state())
    }

    /// Remaining cooldown while Open, zero otherwise
    fn retry_after(&self) -> Duration {
        let machine = self.machine();
        let opened_at = machine.open_data().and_then(|data| data.opened_at);
        let delay = self.timer().as_ref().map(RecoveryTimer::delay);

        match (opened_at, delay) {
            (Some(at), Some(delay)) => delay.saturating_sub(at.elapsed()),
            _ => Duration::ZERO,
        }
    }

    /// Cooldown for the next armed timer, with jitter applied if configured
    fn cooldown(&self) -> Duration {
        let config = &self.context.config;
        if config.jitter_factor > 0.0 {
            let base_ms = config.timeout.as_millis().min(u64::MAX as u128) as u64;
            let policy = chrono_machines::Policy {
                max_attempts: 1,
                base_delay_ms: base_ms,
                multiplier: 1.0,
                max_delay_ms: base_ms,
            };
            Duration::from_millis(policy.calculate_delay(1, config.jitter_factor) as u64)
        } else {
            config.timeout
        }
    }

    /// Move to Open and arm a fresh cooldown. Returns false if the circuit
    /// was already Open.
    fn trip(self: &Arc<Self>) -> bool {
        let mut machine = self.machine();
        if machine.handle(CircuitEvent::Trip).is_err() {
            return false;
        }
        if let Some(data) = machine.open_data_mut() {
            data.opened_at = Some(Instant::now());
        }
        let cooldown = self.arm_timer();
        drop(machine);

        tracing::warn!(
            circuit = self.name(),
            fails = self.fails.load(Ordering::Acquire),
            cooldown_ms = cooldown.as_millis() as u64,
            "circuit opened"
        );
        self.callbacks.trigger_open(self.name());
        if let Some(operation) = &self.operation {
            operation.on_open();
        }
        true
    }

    /// Caller must hold the machine lock
    fn arm_timer(self: &Arc<Self>) -> Duration {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let cooldown = self.cooldown();
        let weak = Arc::downgrade(self);

        let timer = RecoveryTimer::arm(self.name(), generation, cooldown, move |generation| {
            if let Some(shared) = weak.upgrade() {
                shared.cooldown_elapsed(generation);
            }
        });
        // Replacing a previous handle cancels it
        *self.timer() = Some(timer);
        cooldown
    }

    /// Force Closed, clearing the failure count and any pending cooldown.
    /// Returns true if the state actually changed.
    fn close(&self) -> bool {
        let mut machine = self.machine();
        let closed = machine.handle(CircuitEvent::Close).is_ok();
        self.fails.store(0, Ordering::Release);
        let pending = self.timer().take();
        drop(machine);
        drop(pending);

        if closed {
            tracing::info!(circuit = self.name(), "circuit closed");
            self.callbacks.trigger_close(self.name());
            if let Some(operation) = &self.operation {
                operation.on_close();
            }
        }
        closed
    }

    /// Timer callback: re-validate the firing timer, move to HalfOpen and probe
    fn cooldown_elapsed(self: &Arc<Self>, generation: u64) {
        let mut machine = self.machine();
        let armed = self.timer().as_ref().map(RecoveryTimer::generation);
        if armed != Some(generation) {
            tracing::debug!(
                circuit = self.name(),
                generation,
                "ignoring stale recovery timer"
            );
            return;
        }
        let fired = self.timer().take();
        let entered = machine.handle(CircuitEvent::AttemptReset).is_ok();
        drop(machine);
        drop(fired);

        if !entered {
            return;
        }
        tracing::info!(circuit = self.name(), "circuit half-open, probing recovery");
        self.callbacks.trigger_half_open(self.name());
        self.probe();
    }

    /// Single recovery call using the last successful arguments
    fn probe(self: &Arc<Self>) {
        let Some(operation) = &self.operation else {
            self.close();
            return;
        };

        let args = self.last_success().clone().unwrap_or_default();
        self.calls.fetch_add(1, Ordering::AcqRel);

        match operation.call(&args) {
            Ok(_) => {
                tracing::debug!(circuit = self.name(), "recovery probe succeeded");
                self.close();
            }
            Err(_) => {
                let fails = self.fails.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!(circuit = self.name(), fails, "recovery probe failed");
                self.trip();
            }
        }
    }
}

/// Circuit breaker public API
///
/// Cloning yields another handle to the same circuit.
pub struct CircuitBreaker<O: Operation> {
    shared: Arc<Shared<O>>,
}

impl<O: Operation> Clone for CircuitBreaker<O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O: Operation> CircuitBreaker<O> {
    /// Protect `operation` with the default configuration
    pub fn new(operation: O) -> Self {
        Self::with_config(operation, Config::default())
    }

    /// Protect `operation` with an explicit configuration
    pub fn with_config(operation: O, config: Config) -> Self {
        Self::from_parts(
            DEFAULT_NAME.to_string(),
            config,
            Some(operation),
            Callbacks::new(),
        )
    }

    /// A breaker with no operation: every call that is let through is a no-op success
    pub fn inert() -> Self {
        Self::from_parts(
            DEFAULT_NAME.to_string(),
            Config::default(),
            None,
            Callbacks::new(),
        )
    }

    /// Create a new circuit breaker builder
    pub fn builder(operation: O) -> crate::builder::CircuitBuilder<O> {
        crate::builder::CircuitBuilder::new(Some(operation))
    }

    pub(crate) fn from_parts(
        name: String,
        config: Config,
        operation: Option<O>,
        callbacks: Callbacks,
    ) -> Self {
        let context = CircuitContext { name, config };
        let machine = DynamicCircuit::new(context.clone());

        Self {
            shared: Arc::new(Shared {
                context,
                operation,
                callbacks,
                machine: Mutex::new(machine),
                calls: AtomicU64::new(0),
                fails: AtomicUsize::new(0),
                last_success: Mutex::new(None),
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Run the operation with circuit protection
    ///
    /// Fails fast with [`CircuitError::Tripped`] while the circuit is Open;
    /// Closed and HalfOpen let the call through. Returns `Ok(None)` when the breaker wraps no operation.
    /// The operation's own failure is returned unchanged as
    /// [`CircuitError::Execution`].
    pub fn call(&self, args: &O::Args) -> Result<Option<O::Output>, CircuitError<O::Error>> {
        let shared = &self.shared;

        let state = shared.state();
        if state == BreakerState::Open {
            tracing::debug!(circuit = shared.name(), %state, "rejecting call");
            return Err(CircuitError::Tripped {
                circuit: shared.context.name.clone(),
                retry_after: shared.retry_after(),
            });
        }

        let Some(operation) = &shared.operation else {
            return Ok(None);
        };

        shared.calls.fetch_add(1, Ordering::AcqRel);

        match operation.call(args) {
            Ok(output) => {
                shared.fails.store(0, Ordering::Release);
                *shared.last_success() = Some(args.clone());
                Ok(Some(output))
            }
            Err(e) => {
                let fails = shared.fails.fetch_add(1, Ordering::AcqRel) + 1;
                if fails >= shared.context.config.max_fails {
                    shared.trip();
                }
                Err(CircuitError::Execution(e))
            }
        }
    }

    /// Force the circuit Open and start a cooldown. No-op if already Open.
    pub fn open(&self) {
        self.shared.trip();
    }

    /// Force the circuit Closed, cancelling any pending cooldown
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn state(&self) -> BreakerState {
        self.shared.state()
    }

    /// Times the wrapped operation has actually been invoked
    pub fn calls(&self) -> u64 {
        self.shared.calls.load(Ordering::Acquire)
    }

    /// Consecutive failures since the last success
    pub fn fails(&self) -> usize {
        self.shared.fails.load(Ordering::Acquire)
    }

    /// True while a recovery cooldown is armed
    pub fn countdown(&self) -> bool {
        self.shared.timer().is_some()
    }

    /// Check if circuit is open
    pub fn is_open(&self) -> bool {
        self.state() == BreakerState::Open
    }

    /// Check if circuit is closed
    pub fn is_closed(&self) -> bool {
        self.state() == BreakerState::Closed
    }

    /// Get current state name
    pub fn state_name(&self) -> &'static str {
        self.state().as_str()
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn config(&self) -> &Config {
        &self.shared.context.config
    }
}

impl<O: Operation> std::fmt::Debug for CircuitBreaker<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("calls", &self.calls())
            .field("fails", &self.fails())
            .field("countdown", &self.countdown())
            .finish()
    }
}
