//! Traversal history of a machine run.
//!
//! Records which transitions a traced run took, in order, so callers can
//! inspect the path without instrumenting their callables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single transition taken during a run.
///
/// # Example
///
/// ```rust
/// use statescript::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "S".to_string(),
///     to: "N".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.from, "S");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being left
    pub from: String,
    /// The state being entered
    pub to: String,
    /// When the transition's side effects completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of the transitions taken by one run.
///
/// `record` returns a new history and leaves the original untouched.
///
/// # Example
///
/// ```rust
/// use statescript::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: "S".into(),
///         to: "N".into(),
///         timestamp: Utc::now(),
///     })
///     .record(StateTransition {
///         from: "N".into(),
///         to: "E".into(),
///         timestamp: Utc::now(),
///     });
///
/// assert_eq!(history.path(), vec!["S", "N", "E"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append in place. Used by the engine, which owns the history it builds.
    pub(crate) fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// States visited, starting with the first source state.
    ///
    /// Empty when no transition was taken.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
