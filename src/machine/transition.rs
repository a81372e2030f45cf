//! Declared states and transitions.

/// A transition out of some source state. The source is the key it is
/// stored under, so only the destination and hook names live here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub(crate) dst: String,
    pub(crate) condition: String,
    pub(crate) action: String,
}

impl Transition {
    pub(crate) fn new(dst: &str, condition: &str, action: &str) -> Self {
        Self {
            dst: dst.to_string(),
            condition: condition.to_string(),
            action: action.to_string(),
        }
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    /// Condition callable, `None` when the transition always fires.
    pub fn condition(&self) -> Option<&str> {
        non_empty(&self.condition)
    }

    pub fn action(&self) -> Option<&str> {
        non_empty(&self.action)
    }

    pub fn is_unconditional(&self) -> bool {
        self.condition.is_empty()
    }
}

/// Entry and exit callables of a declared state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateHooks {
    pub(crate) entry: String,
    pub(crate) exit: String,
}

impl StateHooks {
    pub fn entry(&self) -> Option<&str> {
        non_empty(&self.entry)
    }

    pub fn exit(&self) -> Option<&str> {
        non_empty(&self.exit)
    }
}

// Empty names mean "no callable".
fn non_empty(name: &str) -> Option<&str> {
    (!name.is_empty()).then_some(name)
}
