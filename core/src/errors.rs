//! Error types for circuit breaker operations

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`CircuitBreaker::call`](crate::CircuitBreaker::call)
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// Circuit is tripped, the call was rejected without running the operation
    #[error("Circuit '{circuit}' is tripped (retry after {retry_after:?})")]
    Tripped {
        circuit: String,
        /// Remaining cooldown before recovery is attempted; zero if no timer is armed
        retry_after: Duration,
    },
    /// The wrapped operation failed
    #[error("Circuit execution failed: {0}")]
    Execution(#[source] E),
}

impl<E> CircuitError<E> {
    /// True when the call failed fast because the circuit is tripped
    pub fn is_tripped(&self) -> bool {
        matches!(self, CircuitError::Tripped { .. })
    }

    /// Borrow the operation's own failure, if this is one
    pub fn execution(&self) -> Option<&E> {
        match self {
            CircuitError::Execution(e) => Some(e),
            CircuitError::Tripped { .. } => None,
        }
    }

    /// Take the operation's own failure, if this is one
    pub fn into_execution(self) -> Option<E> {
        match self {
            CircuitError::Execution(e) => Some(e),
            CircuitError::Tripped { .. } => None,
        }
    }
}
