//! Compiled machines and the execution engine.
//!
//! A run walks the transition table from a start state:
//!
//! 1. Pick the first transition out of the current state whose condition is
//!    truthy. An empty condition always matches.
//! 2. Stop when none matches. The current value is the result.
//! 3. Otherwise call the source's exit hook, the transition action and the
//!    destination's entry hook, in that order, letting each replace the value.
//! 4. Move to the destination and repeat.

mod config;
mod engine;
mod error;
mod transition;

pub use config::RunConfig;
pub use engine::{Machine, Trace};
pub use error::RunError;
pub use transition::{StateHooks, Transition};
