//! Builder API for declaring, validating and compiling machines.
//!
//! States and transitions refer to callables by name only. Nothing is
//! resolved until [`Builder::validate`] or [`Builder::compile`] loads the
//! program from the builder's [`Source`](crate::resolver::Source).

pub mod error;
pub mod machine;
mod validate;

pub use error::{BuildError, CompileError};
pub use machine::Builder;
