//! Build and compile errors.

use thiserror::Error;

/// Errors reported by [`Builder::validate`](crate::Builder::validate).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("state name must not be empty")]
    EmptyStateName,

    /// Also reported, with the *source* state's name, when a transition's
    /// destination is undeclared.
    #[error("state '{0}' not found")]
    StateNotFound(String),

    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("function '{name}' wrong number of arguments: want {want} got {got}")]
    WrongArity {
        name: String,
        want: usize,
        got: usize,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Failure to load the program that backs a machine's callables.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("failed to compile script: {0}")]
    Load(String),
}
