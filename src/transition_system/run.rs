use thiserror::Error;

use crate::prelude::*;

/// Raised when a word asks for a `(state, symbol)` pair that has no rule, and the automaton is
/// configured to treat that as an error (see [`MissingTransitionPolicy::Error`]).
///
/// The same value is also used to record stalls and the point at which a run died in a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transition from {state} on symbol `{symbol}` (position {position})")]
pub struct MissingTransition {
    /// Zero-based index of the symbol in the word.
    pub position: usize,
    /// The state the run was in.
    pub state: State,
    /// The symbol that could not be read.
    pub symbol: char,
}

/// A run is the sequence of states that is visited while reading a finite word, together with
/// the places where the transition table had no rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    states: Vec<State>,
    stalls: Vec<MissingTransition>,
    dead: Option<MissingTransition>,
}

impl Run {
    pub(crate) fn starting_in(initial: State) -> Self {
        Self {
            states: vec![initial],
            stalls: vec![],
            dead: None,
        }
    }

    pub(crate) fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub(crate) fn stall(&mut self, missing: MissingTransition) {
        self.stalls.push(missing);
        self.states.push(missing.state);
    }

    pub(crate) fn die(&mut self, missing: MissingTransition) {
        self.dead = Some(missing);
    }

    /// Returns the sequence of visited states, beginning with the initial state. A stall repeats
    /// the state it happened in, so for a run that did not die, this has one entry more than the
    /// word has symbols.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Returns the last state of the run.
    pub fn reached(&self) -> State {
        *self
            .states
            .last()
            .expect("a run always contains its initial state")
    }

    /// Every position at which the run stayed in place because no rule was defined.
    pub fn stalls(&self) -> &[MissingTransition] {
        &self.stalls
    }

    /// Returns true if at least one stall happened.
    pub fn stalled(&self) -> bool {
        !self.stalls.is_empty()
    }

    /// The position at which the run was aborted, if any.
    pub fn dead(&self) -> Option<&MissingTransition> {
        self.dead.as_ref()
    }

    /// Returns true if the whole word was read.
    pub fn completed(&self) -> bool {
        self.dead.is_none()
    }
}
