//! The operation a circuit breaker protects
//!
//! The breaker knows nothing about what an operation does. It hands over the
//! caller's arguments, observes `Ok`/`Err`, and optionally notifies the
//! operation when the circuit opens or closes.

use std::fmt;
use std::marker::PhantomData;

/// A fallible operation guarded by a [`CircuitBreaker`](crate::CircuitBreaker)
///
/// `Args` must be `Clone` so the breaker can keep the arguments of the last
/// successful call for recovery probes, and `Default` so a probe can still be
/// issued when no call has ever succeeded.
pub trait Operation: Send + Sync + 'static {
    type Args: Clone + Default + Send + Sync + 'static;
    type Output: Send + 'static;
    type Error: Send + 'static;

    /// Run the operation
    fn call(&self, args: &Self::Args) -> Result<Self::Output, Self::Error>;

    /// Called after the circuit enters Open
    fn on_open(&self) {}

    /// Called after the circuit enters Closed
    fn on_close(&self) {}
}

/// Adapter that turns a closure into an [`Operation`]
///
/// ```rust
/// use tripwire::{CircuitBreaker, FnOperation};
///
/// let breaker = CircuitBreaker::new(FnOperation::new(|n: &u32| Ok::<_, String>(n * 2)));
/// assert_eq!(breaker.call(&21).unwrap(), Some(42));
/// ```
pub struct FnOperation<F, A, T, E> {
    f: F,
    _marker: PhantomData<fn(&A) -> Result<T, E>>,
}

impl<F, A, T, E> FnOperation<F, A, T, E>
where
    F: Fn(&A) -> Result<T, E>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, A, T, E> Operation for FnOperation<F, A, T, E>
where
    F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    A: Clone + Default + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Args = A;
    type Output = T;
    type Error = E;

    fn call(&self, args: &A) -> Result<T, E> {
        (self.f)(args)
    }
}

impl<F, A, T, E> fmt::Debug for FnOperation<F, A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("f", &"<closure>")
            .finish()
    }
}
