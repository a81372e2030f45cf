//! Core data types shared by the builder and the engine.
//!
//! - The opaque [`Value`] threaded through every run
//! - Immutable history of the transitions a run took

mod history;
mod value;

pub use history::{StateHistory, StateTransition};
pub use value::{ConversionError, Value};
