//! Referential and signature checks run before compilation.
//!
//! Checks are planned first, then evaluated against the loaded program, so
//! the same plan serves both fail-fast and accumulating validation. Within a
//! state, entry is checked before exit; within a transition, condition
//! before action. Order across states follows map iteration and is not
//! stable.

use crate::builder::error::BuildError;
use crate::machine::{StateHooks, Transition};
use crate::resolver::{Probe, Resolver, HOOK_ARITY};
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

enum Check<'a> {
    StateName(&'a str),
    Function(&'a str),
    SourceDeclared(&'a str),
    /// Reports `src` on failure, not `dst`.
    DestinationDeclared { src: &'a str, dst: &'a str },
}

pub(crate) struct Validator<'a> {
    states: &'a HashMap<String, StateHooks>,
    transitions: &'a HashMap<String, Vec<Transition>>,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(
        states: &'a HashMap<String, StateHooks>,
        transitions: &'a HashMap<String, Vec<Transition>>,
    ) -> Self {
        Self {
            states,
            transitions,
        }
    }

    /// Stop at the first violation.
    pub(crate) fn check<R: Resolver>(&self, program: &R) -> Result<(), BuildError> {
        self.plan()
            .iter()
            .try_for_each(|check| self.evaluate(check, program))
    }

    /// Collect every violation.
    pub(crate) fn check_all<R: Resolver>(
        &self,
        program: &R,
    ) -> Validation<(), NonEmptyVec<BuildError>> {
        let checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = self
            .plan()
            .iter()
            .map(|check| match self.evaluate(check, program) {
                Ok(()) => Validation::success(()),
                Err(e) => Validation::fail(e),
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    fn plan(&self) -> Vec<Check<'a>> {
        let mut plan = Vec::new();

        for (name, hooks) in self.states {
            plan.push(Check::StateName(name));
            plan.extend(hooks.entry().map(Check::Function));
            plan.extend(hooks.exit().map(Check::Function));
        }

        for (src, transitions) in self.transitions {
            plan.push(Check::SourceDeclared(src));
            for t in transitions {
                plan.push(Check::DestinationDeclared { src, dst: t.dst() });
                plan.extend(t.condition().map(Check::Function));
                plan.extend(t.action().map(Check::Function));
            }
        }
        plan
    }

    fn evaluate<R: Resolver>(&self, check: &Check<'_>, program: &R) -> Result<(), BuildError> {
        match *check {
            Check::StateName(name) if name.is_empty() => Err(BuildError::EmptyStateName),
            Check::StateName(_) => Ok(()),
            Check::SourceDeclared(src) if !self.states.contains_key(src) => {
                Err(BuildError::StateNotFound(src.to_string()))
            }
            Check::DestinationDeclared { src, dst } if !self.states.contains_key(dst) => {
                Err(BuildError::StateNotFound(src.to_string()))
            }
            Check::SourceDeclared(_) | Check::DestinationDeclared { .. } => Ok(()),
            Check::Function(name) => check_function(program, name),
        }
    }
}

fn check_function<R: Resolver>(program: &R, name: &str) -> Result<(), BuildError> {
    match program.probe(name) {
        Probe::NotFound => Err(BuildError::FunctionNotFound(name.to_string())),
        Probe::NotCallable => Err(BuildError::NotCallable(name.to_string())),
        Probe::Arity(got) if got != HOOK_ARITY => Err(BuildError::WrongArity {
            name: name.to_string(),
            want: HOOK_ARITY,
            got,
        }),
        Probe::Arity(_) | Probe::Variadic => Ok(()),
    }
}
