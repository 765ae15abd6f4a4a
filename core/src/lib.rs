//! Tripwire - thread-safe circuit breaker with timer-driven recovery
//!
//! This crate provides a circuit breaker that wraps an arbitrary fallible
//! [`Operation`]:
//! - State machine for circuit breaker lifecycle (Closed → Open → HalfOpen)
//! - Consecutive-failure threshold and a fixed recovery cooldown
//! - A cancellable recovery timer that probes with the last successful arguments
//! - Cheap, cloneable handles safe to share across threads
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tripwire::{BreakerState, CircuitBreaker, FnOperation};
//!
//! let circuit = CircuitBreaker::builder(FnOperation::new(|path: &String| {
//!     if path.starts_with('/') {
//!         Ok(format!("fetched {path}"))
//!     } else {
//!         Err("invalid path")
//!     }
//! }))
//! .name("my_service")
//! .max_fails(2)
//! .timeout(Duration::from_secs(30))
//! .on_open(|name| println!("Circuit {} opened!", name))
//! .build();
//!
//! assert_eq!(
//!     circuit.call(&"/health".to_string()).unwrap(),
//!     Some("fetched /health".to_string())
//! );
//!
//! let _ = circuit.call(&"bad".to_string());
//! let _ = circuit.call(&"worse".to_string());
//! assert_eq!(circuit.state(), BreakerState::Open);
//!
//! // Calls now fail fast until the cooldown elapses
//! assert!(circuit.call(&"/health".to_string()).unwrap_err().is_tripped());
//! ```

pub mod builder;
pub mod callbacks;
pub mod circuit;
pub mod errors;
pub mod operation;
mod timer;

pub use builder::CircuitBuilder;
pub use circuit::{CircuitBreaker, Config};
pub use errors::CircuitError;
pub use operation::{FnOperation, Operation};

use std::fmt;

/// State of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakerState {
    /// Calls pass through to the operation
    Closed,
    /// Calls fail fast
    Open,
    /// A single recovery probe is in flight
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "Closed",
            BreakerState::Open => "Open",
            BreakerState::HalfOpen => "HalfOpen",
        }
    }

    /// Map a state name reported by the circuit state machine
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "Closed" => BreakerState::Closed,
            "Open" => BreakerState::Open,
            "HalfOpen" => BreakerState::HalfOpen,
            other => unreachable!("circuit machine reported unknown state {other:?}"),
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
