//! Compiled machine and its execution loop.

use crate::core::{StateHistory, StateTransition, Value};
use crate::machine::config::RunConfig;
use crate::machine::error::RunError;
use crate::machine::transition::Transition;
use crate::resolver::{Call, Outcome, Resolver, Session};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

/// Result of [`Machine::run_traced`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// State the run halted in.
    pub state: String,
    pub value: Value,
    pub history: StateHistory,
}

/// Immutable, run-ready state machine.
///
/// Built by [`Builder::compile`](crate::Builder::compile). A machine holds no
/// mutable state, so one instance can serve any number of concurrent runs;
/// each run opens its own resolver session.
pub struct Machine<P: Resolver> {
    program: P,
    entry: HashMap<String, String>,
    exit: HashMap<String, String>,
    transitions: HashMap<String, Vec<Transition>>,
    config: RunConfig,
}

impl<P: Resolver> Machine<P> {
    pub(crate) fn new(
        program: P,
        entry: HashMap<String, String>,
        exit: HashMap<String, String>,
        transitions: HashMap<String, Vec<Transition>>,
    ) -> Self {
        Self {
            program,
            entry,
            exit,
            transitions,
            config: RunConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Transitions leaving `src`, in evaluation order.
    pub fn transitions_from(&self, src: &str) -> &[Transition] {
        self.transitions.get(src).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run from `start` with a host value, until no transition is available.
    ///
    /// Returns the final value, or the first error any callable produced.
    pub fn run<T: Serialize + ?Sized>(&self, start: &str, input: &T) -> Result<Value, RunError> {
        let value = Value::from_serialize(input)?;
        self.run_value(start, value)
    }

    /// Like [`run`](Self::run), starting from an existing [`Value`].
    pub fn run_value(&self, start: &str, value: Value) -> Result<Value, RunError> {
        self.execute(start, value, &mut |_, _| {})
    }

    /// Like [`run`](Self::run), also recording every transition taken.
    pub fn run_traced<T: Serialize + ?Sized>(
        &self,
        start: &str,
        input: &T,
    ) -> Result<Trace, RunError> {
        let value = Value::from_serialize(input)?;
        let mut history = StateHistory::new();
        let value = self.execute(start, value, &mut |from, to| {
            history.push(StateTransition {
                from: from.to_string(),
                to: to.to_string(),
                timestamp: Utc::now(),
            });
        })?;

        let state = history
            .transitions()
            .last()
            .map_or(start, |t| t.to.as_str())
            .to_string();
        Ok(Trace {
            state,
            value,
            history,
        })
    }

    #[instrument(skip(self, value, on_step), fields(run_id = %Uuid::new_v4()))]
    fn execute(
        &self,
        start: &str,
        mut value: Value,
        on_step: &mut dyn FnMut(&str, &str),
    ) -> Result<Value, RunError> {
        let mut session = self.program.session()?;
        let mut current = start;
        let mut steps = 0usize;
        debug!("run started");

        while let Some(transition) = self.select(session.as_mut(), current, &value)? {
            if let Some(limit) = self.config.max_steps {
                if steps >= limit {
                    debug!(limit, state = current, "step limit exceeded");
                    return Err(RunError::StepLimitExceeded {
                        limit,
                        state: current.to_string(),
                    });
                }
            }

            value = self.apply(session.as_mut(), current, transition, value)?;
            on_step(current, transition.dst());
            current = transition.dst();
            steps += 1;
        }

        debug!(state = current, steps, "run halted");
        Ok(value)
    }

    /// First transition out of `src` whose condition holds.
    fn select(
        &self,
        session: &mut (dyn Session + '_),
        src: &str,
        value: &Value,
    ) -> Result<Option<&Transition>, RunError> {
        let Some(transitions) = self.transitions.get(src) else {
            return Ok(None);
        };

        for transition in transitions {
            let Some(condition) = transition.condition() else {
                return Ok(Some(transition));
            };
            let satisfied = invoke(session, condition, src, transition.dst(), value)?
                .is_some_and(|v| v.is_truthy());
            trace!(src, dst = transition.dst(), condition, satisfied, "condition evaluated");
            if satisfied {
                return Ok(Some(transition));
            }
        }
        Ok(None)
    }

    /// Exit of `src`, transition action, then entry of `dst`. Each step may
    /// replace the value; a domain error stops the sequence.
    fn apply(
        &self,
        session: &mut (dyn Session + '_),
        src: &str,
        transition: &Transition,
        mut value: Value,
    ) -> Result<Value, RunError> {
        let dst = transition.dst();
        let hooks = [
            self.exit.get(src).map(String::as_str),
            transition.action(),
            self.entry.get(dst).map(String::as_str),
        ];

        for function in hooks.into_iter().flatten() {
            if let Some(replacement) = invoke(session, function, src, dst, &value)? {
                trace!(src, dst, function, "value replaced");
                value = replacement;
            }
        }
        Ok(value)
    }
}

/// Invoke one callable. `None` means the value is unchanged.
fn invoke(
    session: &mut (dyn Session + '_),
    function: &str,
    src: &str,
    dst: &str,
    value: &Value,
) -> Result<Option<Value>, RunError> {
    let outcome = session.invoke(&Call {
        function,
        src,
        dst,
        value,
    })?;

    match outcome {
        Outcome::Unchanged => Ok(None),
        Outcome::Replace(replacement) => Ok(Some(replacement)),
        Outcome::Fail(message) => {
            debug!(function, src, dst, %message, "callable returned domain error");
            Err(RunError::Domain {
                function: function.to_string(),
                src: src.to_string(),
                dst: dst.to_string(),
                message,
            })
        }
    }
}
