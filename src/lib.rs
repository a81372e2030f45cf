//! Statescript: a finite state machine engine driven by named callables
//!
//! A host declares states and ordered transitions that refer to conditions
//! and actions *by name*. A [`resolver::Resolver`] maps those names onto real
//! code: native closures, or contexts of an embedded interpreter. The engine
//! itself only decides which transition fires and in what order the hooks
//! run, threading an opaque [`Value`] from one hook to the next.
//!
//! # Core Concepts
//!
//! - **Builder**: collects states and transitions; validates and compiles them
//! - **Machine**: the immutable compiled result; shareable across threads
//! - **Resolver**: turns callable names into invocations with `(src, dst, value)`
//! - **Value**: the data a run carries; hooks replace it, never mutate it
//!
//! # Example
//!
//! ```rust
//! use statescript::resolver::{NativeModule, Outcome};
//! use statescript::{Builder, Value};
//!
//! let module = NativeModule::new()
//!     .function("is_eol", |_, _, v| Outcome::replace(v.as_str() == Some("")))
//!     .function("chop", |_, _, v| {
//!         let s = v.as_str().unwrap_or_default();
//!         Outcome::replace(s.chars().skip(1).collect::<String>())
//!     })
//!     .function("done", |_, _, _| Outcome::replace("done"));
//!
//! let machine = Builder::new(module)
//!     .state("Read", "chop", "")
//!     .state("End", "done", "")
//!     .transition_if("Read", "End", "is_eol")
//!     .transition_always("Read", "Read")
//!     .validate_compile()
//!     .unwrap();
//!
//! assert_eq!(machine.run("Read", "abc").unwrap(), Value::from("done"));
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod resolver;

// Re-export commonly used types
pub use builder::{BuildError, Builder, CompileError};
pub use core::{StateHistory, StateTransition, Value};
pub use machine::{Machine, RunConfig, RunError, Trace};
pub use resolver::{NativeModule, Outcome};
