//! Builder API for ergonomic circuit breaker configuration

use crate::{
    callbacks::Callbacks,
    circuit::{CircuitBreaker, Config, DEFAULT_NAME},
    operation::Operation,
};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating circuit breakers with fluent API
pub struct CircuitBuilder<O: Operation> {
    name: String,
    config: Config,
    operation: Option<O>,
    callbacks: Callbacks,
}

impl<O: Operation> CircuitBuilder<O> {
    /// Create a new builder; `None` builds an inert breaker
    pub fn new(operation: Option<O>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            config: Config::default(),
            operation,
            callbacks: Callbacks::new(),
        }
    }

    /// Name used in errors, logs and callbacks
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the whole configuration, e.g. one loaded by the host
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the consecutive-failure threshold
    pub fn max_fails(mut self, max_fails: usize) -> Self {
        self.config.max_fails = max_fails;
        self
    }

    /// Set the cooldown before a recovery probe
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the cooldown in seconds; negative or non-finite values are ignored
    pub fn timeout_secs(mut self, seconds: f64) -> Self {
        if let Ok(timeout) = Duration::try_from_secs_f64(seconds) {
            self.config.timeout = timeout;
        }
        self
    }

    /// Set the jitter factor (0.0 = no jitter, 1.0 = full jitter)
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.config.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set callback for when circuit opens
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_open = Some(Arc::new(f));
        self
    }

    /// Set callback for when circuit closes
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    /// Set callback for when circuit enters half-open
    pub fn on_half_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_half_open = Some(Arc::new(f));
        self
    }

    /// Build the circuit breaker
    pub fn build(self) -> CircuitBreaker<O> {
        CircuitBreaker::from_parts(self.name, self.config, self.operation, self.callbacks)
    }
}

impl<O: Operation> std::fmt::Debug for CircuitBuilder<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBuilder")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("operation", &self.operation.is_some())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
