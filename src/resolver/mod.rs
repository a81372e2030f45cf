//! Callable Resolver contract.
//!
//! The engine never runs user code itself. Every condition, action, entry and
//! exit hook is a *name* that a [`Resolver`] turns into a call taking exactly
//! three positional arguments: the source state, the destination state and
//! a read-only view of the current [`Value`].
//!
//! # Key Concepts
//!
//! - **Source**: loads user-supplied code into a runnable program (`Compile` time)
//! - **Resolver**: the loaded program; answers signature probes and opens sessions
//! - **Session**: an isolated execution context, opened once per `Run`
//!
//! Two backings ship with the crate: [`NativeModule`] for statically compiled
//! callbacks, and [`Pool`] for stateful interpreter contexts that must never
//! be shared between concurrent runs.

mod native;
mod pool;

pub use native::NativeModule;
pub use pool::{Interpreter, Pool};

use crate::builder::CompileError;
use crate::core::Value;
use thiserror::Error;

/// Number of positional arguments every hook receives: `(src, dst, value)`.
pub const HOOK_ARITY: usize = 3;

/// One invocation of a named callable.
#[derive(Clone, Copy, Debug)]
pub struct Call<'a> {
    pub function: &'a str,
    pub src: &'a str,
    pub dst: &'a str,
    pub value: &'a Value,
}

/// What a callable asked the engine to do with the current value.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No return value. The current value is kept.
    Unchanged,

    /// Replace the current value.
    Replace(Value),

    /// Domain error. The run stops and reports this message.
    Fail(String),
}

impl Outcome {
    pub fn replace(value: impl Into<Value>) -> Self {
        Self::Replace(value.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Truthiness of a condition result. "No return" counts as falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Replace(value) => value.is_truthy(),
            Self::Unchanged | Self::Fail(_) => false,
        }
    }
}

/// Signature of a named export, as seen by validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    NotFound,

    /// The name exists but is plain data.
    NotCallable,

    /// A callable with a fixed parameter count.
    Arity(usize),

    /// A builtin-style callable accepting any number of arguments.
    Variadic,
}

/// Host or runtime fault while invoking a callable.
///
/// Distinct from [`Outcome::Fail`], which is a callable's own decision.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvocationError {
    #[error("function '{0}' not found")]
    NotFound(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("function '{name}' wrong number of arguments: want {want} got {got}")]
    WrongArity {
        name: String,
        want: usize,
        got: usize,
    },

    #[error("failed to acquire execution context: {0}")]
    Context(String),

    #[error("function '{function}' panicked")]
    Panicked { function: String },

    #[error("function '{function}' failed: {reason}")]
    Failed { function: String, reason: String },
}

/// Isolated execution context for a single run.
pub trait Session {
    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError>;
}

/// A loaded program that can resolve callables by name.
///
/// Compiled machines share their resolver across concurrent runs, so any
/// state the resolver wraps must live inside the sessions it hands out.
pub trait Resolver: Send + Sync {
    /// Inspect a name without invoking it.
    fn probe(&self, name: &str) -> Probe;

    /// Open an execution context for one run.
    fn session(&self) -> Result<Box<dyn Session + '_>, InvocationError>;
}

/// User-supplied code that can be loaded into a [`Resolver`].
pub trait Source {
    type Program: Resolver;

    fn load(&self) -> Result<Self::Program, CompileError>;
}

/// [`Source`] backed by a loader closure.
pub struct FromFn<F>(F);

/// Adapt a loader closure into a [`Source`].
///
/// # Example
///
/// ```rust
/// use statescript::resolver::{from_fn, NativeModule, Outcome};
/// use statescript::Builder;
///
/// let source = from_fn(|| Ok(NativeModule::new().function("noop", |_, _, _| Outcome::Unchanged)));
/// let machine = Builder::new(source).state("S", "noop", "").compile();
/// assert!(machine.is_ok());
/// ```
pub fn from_fn<F, P>(loader: F) -> FromFn<F>
where
    F: Fn() -> Result<P, CompileError>,
    P: Resolver,
{
    FromFn(loader)
}

impl<F, P> Source for FromFn<F>
where
    F: Fn() -> Result<P, CompileError>,
    P: Resolver,
{
    type Program = P;

    fn load(&self) -> Result<P, CompileError> {
        (self.0)()
    }
}
