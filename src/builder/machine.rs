//! Builder for declaring and compiling state machines.

use crate::builder::error::{BuildError, CompileError};
use crate::builder::validate::Validator;
use crate::machine::{Machine, StateHooks, Transition};
use crate::resolver::Source;
use std::collections::HashMap;
use stillwater::validation::Validation;
use tracing::debug;

/// Accumulates states and transitions, then compiles them into a [`Machine`].
///
/// Declaring never fails. Problems such as unknown states or missing
/// callables are reported by [`validate`](Self::validate); [`compile`](Self::compile)
/// alone skips those checks and defers them to run time.
///
/// # Example
///
/// ```rust
/// use statescript::resolver::{NativeModule, Outcome};
/// use statescript::Builder;
///
/// let module = NativeModule::new()
///     .function("truthy", |_, _, v| Outcome::replace(v.is_truthy()))
///     .function("falsy", |_, _, v| Outcome::replace(!v.is_truthy()));
///
/// let machine = Builder::new(module)
///     .state("S", "", "")
///     .state("T", "", "")
///     .state("F", "", "")
///     .transition_if("S", "T", "truthy")
///     .transition_if("S", "F", "falsy")
///     .validate_compile()
///     .unwrap();
///
/// let trace = machine.run_traced("S", &1).unwrap();
/// assert_eq!(trace.state, "T");
/// ```
pub struct Builder<S: Source> {
    source: S,
    states: HashMap<String, StateHooks>,
    transitions: HashMap<String, Vec<Transition>>,
}

impl<S: Source> Builder<S> {
    /// Create a builder over user-supplied code.
    pub fn new(source: S) -> Self {
        Self {
            source,
            states: HashMap::new(),
            transitions: HashMap::new(),
        }
    }

    /// Declare a state with its entry and exit callables.
    ///
    /// Empty names mean no hook. Declaring the same state again replaces its
    /// hooks.
    pub fn state(mut self, name: &str, entry: &str, exit: &str) -> Self {
        self.states.insert(
            name.to_string(),
            StateHooks {
                entry: entry.to_string(),
                exit: exit.to_string(),
            },
        );
        self
    }

    /// Append a transition from `src` to `dst`.
    ///
    /// Transitions out of the same state are evaluated in the order they were
    /// added. An empty `condition` always matches; an empty `action` does nothing.
    pub fn transition(mut self, src: &str, dst: &str, condition: &str, action: &str) -> Self {
        self.transitions
            .entry(src.to_string())
            .or_default()
            .push(Transition::new(dst, condition, action));
        self
    }

    /// Append a guarded transition with no action.
    pub fn transition_if(self, src: &str, dst: &str, condition: &str) -> Self {
        self.transition(src, dst, condition, "")
    }

    /// Append an unconditional transition with no action.
    pub fn transition_always(self, src: &str, dst: &str) -> Self {
        self.transition(src, dst, "", "")
    }

    /// Names of all declared states, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn hooks(&self, state: &str) -> Option<&StateHooks> {
        self.states.get(state)
    }

    /// Transitions declared out of `src`, in evaluation order.
    pub fn transitions_from(&self, src: &str) -> &[Transition] {
        self.transitions
            .get(src)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check that every state is named, every transition connects declared
    /// states, and every referenced callable exists and takes `(src, dst, value)`.
    ///
    /// Reports the first problem found. When several exist, which one is
    /// reported is unspecified.
    pub fn validate(&self) -> Result<(), BuildError> {
        let program = self.source.load()?;
        let result = self.validator().check(&program);
        if let Err(e) = &result {
            debug!(error = %e, "validation failed");
        }
        result
    }

    /// Like [`validate`](Self::validate), but reports every problem.
    pub fn validate_all(&self) -> Result<(), Vec<BuildError>> {
        let program = self
            .source
            .load()
            .map_err(|e| vec![BuildError::Compile(e)])?;

        match self.validator().check_all(&program) {
            Validation::Success(()) => Ok(()),
            Validation::Failure(errors) => {
                debug!(count = errors.len(), "validation failed");
                Err(errors.iter().cloned().collect())
            }
        }
    }

    /// Load the program and freeze the declarations, without validating.
    pub fn compile(self) -> Result<Machine<S::Program>, CompileError> {
        let program = self.source.load()?;
        Ok(self.freeze(program))
    }

    /// [`validate`](Self::validate) then [`compile`](Self::compile), loading
    /// the program once.
    pub fn validate_compile(self) -> Result<Machine<S::Program>, BuildError> {
        let program = self.source.load()?;
        self.validator().check(&program)?;
        Ok(self.freeze(program))
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.states, &self.transitions)
    }

    fn freeze(self, program: S::Program) -> Machine<S::Program> {
        debug!(
            states = self.states.len(),
            sources = self.transitions.len(),
            "machine compiled"
        );

        let mut entry = HashMap::new();
        let mut exit = HashMap::new();
        for (name, hooks) in self.states {
            if !hooks.entry.is_empty() {
                entry.insert(name.clone(), hooks.entry);
            }
            if !hooks.exit.is_empty() {
                exit.insert(name, hooks.exit);
            }
        }
        Machine::new(program, entry, exit, self.transitions)
    }
}
