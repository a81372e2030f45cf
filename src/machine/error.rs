//! Run errors.

use crate::core::ConversionError;
use crate::resolver::InvocationError;
use thiserror::Error;

/// Errors that stop a [`Machine::run`](crate::Machine::run).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunError {
    /// The initial value has no [`Value`](crate::Value) representation.
    #[error(transparent)]
    ValueConversion(#[from] ConversionError),

    /// The resolver could not execute a callable.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A callable returned a domain error.
    #[error("{message}")]
    Domain {
        function: String,
        src: String,
        dst: String,
        message: String,
    },

    #[error("step limit of {limit} exceeded in state '{state}'")]
    StepLimitExceeded { limit: usize, state: String },
}
