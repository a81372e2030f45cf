//! Checked-out interpreter contexts for stateful runtimes.
//!
//! Most embedded interpreters keep globals, caches or a VM stack that must
//! not be touched by two runs at once. A [`Pool`] hands each run its own
//! [`Interpreter`] and takes it back when the run ends.

use super::{Call, InvocationError, Outcome, Probe, Resolver, Session};
use crate::builder::CompileError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Default number of idle interpreters kept for reuse.
pub const DEFAULT_MAX_IDLE: usize = 8;

/// A single-threaded execution context of some embedded runtime.
pub trait Interpreter: Send {
    fn probe(&self, name: &str) -> Probe;

    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError>;

    /// Called before the context goes back to the pool.
    fn reset(&mut self) {}
}

type Factory<I> = Box<dyn Fn() -> Result<I, CompileError> + Send + Sync>;

/// Resolver that isolates runs by checking out one interpreter per session.
///
/// # Example
///
/// ```rust
/// use statescript::resolver::{Call, Interpreter, InvocationError, Outcome, Pool, Probe, Resolver};
///
/// struct Echo;
///
/// impl Interpreter for Echo {
///     fn probe(&self, _name: &str) -> Probe {
///         Probe::Arity(3)
///     }
///
///     fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
///         Ok(Outcome::replace(call.dst))
///     }
/// }
///
/// let pool = Pool::new(|| Ok(Echo)).unwrap();
/// assert_eq!(pool.probe("anything"), Probe::Arity(3));
/// ```
pub struct Pool<I: Interpreter> {
    factory: Factory<I>,
    prober: Mutex<I>,
    idle: Mutex<Vec<I>>,
    max_idle: usize,
}

impl<I: Interpreter> Pool<I> {
    /// Create a pool. The factory runs once up front so load errors surface
    /// at compile time rather than on the first run.
    pub fn new<F>(factory: F) -> Result<Self, CompileError>
    where
        F: Fn() -> Result<I, CompileError> + Send + Sync + 'static,
    {
        let prober = factory()?;
        Ok(Self {
            factory: Box::new(factory),
            prober: Mutex::new(prober),
            idle: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE,
        })
    }

    /// Cap the number of idle interpreters retained between runs.
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Interpreters currently waiting for a run.
    pub fn idle(&self) -> usize {
        lock(&self.idle).len()
    }

    fn checkout(&self) -> Result<I, InvocationError> {
        if let Some(interpreter) = lock(&self.idle).pop() {
            trace!("reusing pooled interpreter");
            return Ok(interpreter);
        }
        trace!("creating interpreter");
        (self.factory)().map_err(|e| InvocationError::Context(e.to_string()))
    }

    fn release(&self, mut interpreter: I) {
        interpreter.reset();
        let mut idle = lock(&self.idle);
        if idle.len() < self.max_idle {
            idle.push(interpreter);
        }
    }
}

// A poisoned lock only means another run panicked mid-checkout; the pool
// itself is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Checkout<'a, I: Interpreter> {
    pool: &'a Pool<I>,
    interpreter: Option<I>,
}

impl<I: Interpreter> Session for Checkout<'_, I> {
    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
        let Some(interpreter) = self.interpreter.as_mut() else {
            return Err(InvocationError::Context("interpreter discarded after panic".into()));
        };

        match catch_unwind(AssertUnwindSafe(|| interpreter.invoke(call))) {
            Ok(result) => result,
            Err(_) => {
                // Interpreter state is unknown after unwinding mid-call; never
                // hand it to another run.
                debug!(function = call.function, "interpreter panicked, discarding");
                self.interpreter = None;
                Err(InvocationError::Panicked {
                    function: call.function.to_string(),
                })
            }
        }
    }
}

impl<I: Interpreter> Drop for Checkout<'_, I> {
    fn drop(&mut self) {
        if let Some(interpreter) = self.interpreter.take() {
            self.pool.release(interpreter);
        }
    }
}

impl<I: Interpreter> Resolver for Pool<I> {
    fn probe(&self, name: &str) -> Probe {
        lock(&self.prober).probe(name)
    }

    fn session(&self) -> Result<Box<dyn Session + '_>, InvocationError> {
        let interpreter = self.checkout()?;
        Ok(Box::new(Checkout {
            pool: self,
            interpreter: Some(interpreter),
        }))
    }
}
