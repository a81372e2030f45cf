//! Per-machine run configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to every run of a machine.
///
/// The default is unbounded: a cyclic graph whose conditions always hold
/// runs forever. Callers that need a ceiling opt in with `max_steps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum number of transitions a single run may take.
    pub max_steps: Option<usize>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort a run with `StepLimitExceeded` once it has taken `steps`
    /// transitions and another one is selected.
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }
}
