use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::{math::OrderedSet, prelude::*};

/// Locating the individual declarations inside the description text.
pub mod layout;
pub use layout::{Layout, LineLayout};

/// Turns description text into a [`Descriptor`].
pub mod parser;

/// Violations of the invariants a well-formed DFA should satisfy. The parser never checks these,
/// they are only raised when a [`Validation`] level is requested explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// The start state is not among the declared states.
    #[error("start state {0} is not a declared state")]
    StartNotDeclared(State),
    /// Some accepting states are not among the declared states.
    #[error("accepting states {} are not declared states", State::show_collection(.0))]
    AcceptingNotDeclared(Vec<State>),
    /// A transition leaves from or leads into a state that was never declared.
    #[error("transition {0} uses a state that is not declared")]
    UndeclaredTransitionState(Transition),
    /// A transition is labeled with a symbol outside of the alphabet.
    #[error("transition {0} uses a symbol that is not part of the alphabet")]
    SymbolNotInAlphabet(Transition),
    /// The transition table is not total over states x alphabet.
    #[error("transition table is incomplete, {} pair(s) have no rule, e.g. ({}, {})", .0.len(), .0[0].0, .0[0].1)]
    Incomplete(Vec<(State, char)>),
}

/// How thoroughly a [`Descriptor`] is checked before an automaton is built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Validation {
    /// Accept the descriptor as it was parsed.
    #[default]
    None,
    /// The start state, all accepting states and all transition endpoints must be declared
    /// states and every transition symbol must belong to the alphabet.
    Consistent,
    /// Like [`Validation::Consistent`], additionally every state must have a rule for every symbol.
    Total,
}

/// The structured representation of a DFA: its states, the alphabet, the start state,
/// the accepting states and the transition table.
///
/// A descriptor is built once, either by the [`crate::DescriptorParser`] or through a
/// [`DescriptorBuilder`], and cannot be modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    states: OrderedSet<State>,
    alphabet: CharAlphabet,
    start: State,
    accepting: OrderedSet<State>,
    transitions: TransitionTable,
}

impl Descriptor {
    /// Assembles a descriptor from its parts. No consistency checks are done here, see
    /// [`Descriptor::validate`].
    pub fn new(
        states: OrderedSet<State>,
        alphabet: CharAlphabet,
        start: State,
        accepting: OrderedSet<State>,
        transitions: TransitionTable,
    ) -> Self {
        debug!(
            "built descriptor with {} states, alphabet {}, start {}, accepting {} and {} rules",
            states.len(),
            alphabet.show(),
            start,
            State::show_collection(&accepting),
            transitions.len()
        );
        Self {
            states,
            alphabet,
            start,
            accepting,
            transitions,
        }
    }

    /// Instantiates a new, empty [`DescriptorBuilder`].
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// The declared states in ascending order.
    pub fn states(&self) -> &OrderedSet<State> {
        &self.states
    }

    /// The alphabet the automaton is defined over.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// The state every run begins in.
    pub fn start(&self) -> State {
        self.start
    }

    /// The accepting states in ascending order.
    pub fn accepting(&self) -> &OrderedSet<State> {
        &self.accepting
    }

    /// Returns true if `state` is accepting.
    pub fn is_accepting(&self, state: State) -> bool {
        self.accepting.contains(&state)
    }

    /// The transition table.
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Checks the descriptor against the given [`Validation`] level.
    pub fn validate(&self, level: Validation) -> Result<(), SemanticError> {
        match level {
            Validation::None => Ok(()),
            Validation::Consistent => self.check_consistent(),
            Validation::Total => {
                self.check_consistent()?;
                self.check_total()
            }
        }
    }

    fn check_consistent(&self) -> Result<(), SemanticError> {
        if !self.states.contains(&self.start) {
            return Err(SemanticError::StartNotDeclared(self.start));
        }

        let undeclared = self.accepting.difference(&self.states).copied().collect_vec();
        if !undeclared.is_empty() {
            return Err(SemanticError::AcceptingNotDeclared(undeclared));
        }

        for transition in self.transitions.transitions() {
            if !self.states.contains(&transition.source) || !self.states.contains(&transition.target)
            {
                return Err(SemanticError::UndeclaredTransitionState(transition));
            }
            if !self.alphabet.contains(transition.symbol) {
                return Err(SemanticError::SymbolNotInAlphabet(transition));
            }
        }
        Ok(())
    }

    fn check_total(&self) -> Result<(), SemanticError> {
        let missing = self.transitions.missing(&self.states, &self.alphabet);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SemanticError::Incomplete(missing))
        }
    }

    /// Renders the transition table with one row per state and one column per symbol. Pairs
    /// without a rule are shown as `-`.
    pub fn render_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(self.alphabet.universe().map(|s| s.show())),
        );
        for state in &self.states {
            let mut label = state.show();
            if *state == self.start {
                label = format!("-> {label}");
            }
            if self.is_accepting(*state) {
                label.push_str(" *");
            }
            let mut row = vec![label];
            for sym in self.alphabet.universe() {
                match self.transitions.successor(*state, sym) {
                    Some(target) => row.push(target.show()),
                    None => row.push("-".to_string()),
                }
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    /// Writes the descriptor in the positional layout described by `layout`, which
    /// [`Layout::Positional`] reads back into an equal descriptor. States are written in
    /// ascending order, so with [`StateNumbering::Counted`] this holds as long as the states are
    /// exactly `1..=n`.
    ///
    /// # Panics
    /// If two declarations of `layout` share a line or the transition block does not come last.
    pub fn to_positional_text(&self, layout: &LineLayout) -> String {
        let declarations = [layout.states, layout.alphabet, layout.start, layout.accepting];
        assert!(
            declarations.iter().all_unique(),
            "declarations must be on distinct lines"
        );
        assert!(
            declarations.iter().all(|line| *line < layout.transitions),
            "the transition block must come last"
        );

        let mut lines = vec![String::new(); layout.transitions];
        lines[layout.states] = format!("Q = {}", State::show_collection(&self.states));
        lines[layout.alphabet] = format!("Σ = {}", self.alphabet.show());
        lines[layout.start] = format!("Start state: {}", self.start);
        lines[layout.accepting] = format!("F = {}", State::show_collection(&self.accepting));
        lines.extend(self.transitions.rules().map(|t| t.show()));
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Writes the descriptor in the sectioned layout.
impl Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "states: {}", State::show_collection(&self.states))?;
        writeln!(f, "alphabet: {}", self.alphabet.show())?;
        writeln!(f, "start: {}", self.start)?;
        writeln!(f, "accepting: {}", State::show_collection(&self.accepting))?;
        writeln!(f, "transitions:")?;
        for rule in self.transitions.rules() {
            writeln!(f, "  {}", rule.show())?;
        }
        Ok(())
    }
}

/// Helper struct for the construction of a [`Descriptor`] in code.
///
/// # Example
///
/// We want to create a DFA with two states 1 and 2 over the alphabet `['a', 'b']`, where reading
/// `a` in state 1 leads to state 2 and reading `b` in state 2 leads back. State 2 is accepting and
/// state 1 is initial.
/// ```
/// use dfa_sim::prelude::*;
///
/// let dfa = DescriptorBuilder::default()
///     .with_states(1..=2)
///     .with_alphabet(['a', 'b'])
///     .with_accepting([2])
///     .with_transitions([(1, 'a', 2), (2, 'b', 1)])
///     .into_dfa(1); // 1 is the start state
/// assert!(dfa.accepts("aba"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    states: OrderedSet<State>,
    alphabet: Vec<char>,
    accepting: OrderedSet<State>,
    transitions: TransitionTable,
}

impl DescriptorBuilder {
    /// Adds the given states.
    pub fn with_states<I: IntoIterator<Item = u32>>(mut self, states: I) -> Self {
        self.states.extend(states.into_iter().map(State::new));
        self
    }

    /// Adds the given symbols to the alphabet.
    pub fn with_alphabet<I: IntoIterator<Item = char>>(mut self, symbols: I) -> Self {
        self.alphabet.extend(symbols);
        self
    }

    /// Marks the given states as accepting.
    pub fn with_accepting<I: IntoIterator<Item = u32>>(mut self, states: I) -> Self {
        self.accepting.extend(states.into_iter().map(State::new));
        self
    }

    /// Adds the given transitions, later ones override earlier ones for the same `(state, symbol)` pair.
    pub fn with_transitions<T: Into<Transition>, I: IntoIterator<Item = T>>(
        mut self,
        transitions: I,
    ) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Builds the descriptor with `start` as its start state.
    pub fn into_descriptor(self, start: u32) -> Descriptor {
        Descriptor::new(
            self.states,
            CharAlphabet::new(self.alphabet),
            State::new(start),
            self.accepting,
            self.transitions,
        )
    }

    /// Builds the descriptor with `start` as its start state and turns it into a [`Dfa`] with the
    /// default options.
    pub fn into_dfa(self, start: u32) -> Dfa {
        Dfa::new(self.into_descriptor(start))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn toggle() -> DescriptorBuilder {
        DescriptorBuilder::default()
            .with_states(1..=2)
            .with_alphabet(['a', 'b'])
            .with_accepting([2])
            .with_transitions([(1, 'a', 2), (2, 'b', 1)])
    }

    #[test]
    fn validation_levels() {
        let descriptor = toggle().into_descriptor(1);
        assert_eq!(descriptor.validate(Validation::None), Ok(()));
        assert_eq!(descriptor.validate(Validation::Consistent), Ok(()));
        assert_eq!(
            descriptor.validate(Validation::Total),
            Err(SemanticError::Incomplete(vec![
                (State::new(1), 'b'),
                (State::new(2), 'a')
            ]))
        );

        let total = toggle()
            .with_transitions([(1, 'b', 1), (2, 'a', 2)])
            .into_descriptor(1);
        assert_eq!(total.validate(Validation::Total), Ok(()));
    }

    #[test]
    fn inconsistent_descriptors() {
        assert_eq!(
            toggle().into_descriptor(3).validate(Validation::Consistent),
            Err(SemanticError::StartNotDeclared(State::new(3)))
        );
        assert_eq!(
            toggle()
                .with_accepting([5, 7])
                .into_descriptor(1)
                .validate(Validation::Consistent),
            Err(SemanticError::AcceptingNotDeclared(vec![
                State::new(5),
                State::new(7)
            ]))
        );
        assert_eq!(
            toggle()
                .with_transitions([(2, 'a', 9)])
                .into_descriptor(1)
                .validate(Validation::Consistent),
            Err(SemanticError::UndeclaredTransitionState(Transition::from((
                2, 'a', 9
            ))))
        );
        assert_eq!(
            toggle()
                .with_transitions([(1, 'c', 1)])
                .into_descriptor(1)
                .validate(Validation::Consistent),
            Err(SemanticError::SymbolNotInAlphabet(Transition::from((
                1, 'c', 1
            ))))
        );
    }

    #[test]
    fn semantic_error_messages() {
        assert_eq!(
            SemanticError::AcceptingNotDeclared(vec![State::new(4), State::new(5)]).to_string(),
            "accepting states {q4, q5} are not declared states"
        );
        assert_eq!(
            SemanticError::Incomplete(vec![(State::new(1), 'b')]).to_string(),
            "transition table is incomplete, 1 pair(s) have no rule, e.g. (q1, b)"
        );
    }

    #[test]
    fn sectioned_rendering() {
        let descriptor = toggle().into_descriptor(1);
        assert_eq!(
            descriptor.to_string(),
            "states: {q1, q2}\nalphabet: {a, b}\nstart: q1\naccepting: {q2}\ntransitions:\n  (q1, a, q2)\n  (q2, b, q1)\n"
        );
    }

    #[test]
    fn table_rendering() {
        let table = toggle().into_descriptor(1).render_table();
        assert!(table.contains("-> q1"));
        assert!(table.contains("q2 *"));
        assert!(table.lines().any(|line| line.contains("State") && line.contains('b')));
    }
}
