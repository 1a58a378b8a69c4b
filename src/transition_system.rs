use std::fmt::Display;

use itertools::Itertools;
use tracing::warn;

use crate::{alphabet::CharAlphabet, math::Map, Show};

/// Contains [`run::Run`], the trace of reading a word, together with the error that is raised when
/// a run hits an undefined transition.
pub mod run;

/// The identifier of a state. A state carries no information besides its identity, whether it is
/// initial or accepting is determined by the [`crate::Descriptor`] it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(u32);

impl State {
    /// Creates the state with the given identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric identifier of the state.
    pub const fn id(&self) -> u32 {
        self.0
    }
}

impl From<u32> for State {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl Show for State {
    fn show(&self) -> String {
        self.to_string()
    }
}

/// A single rule of the transition function: reading `symbol` in `source` leads to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    /// The state in which the rule applies.
    pub source: State,
    /// The symbol that is consumed.
    pub symbol: char,
    /// The state that is reached.
    pub target: State,
}

impl Transition {
    /// Creates a new transition from `source` to `target` on `symbol`.
    pub fn new(source: State, symbol: char, target: State) -> Self {
        Self {
            source,
            symbol,
            target,
        }
    }
}

impl From<(u32, char, u32)> for Transition {
    fn from((source, symbol, target): (u32, char, u32)) -> Self {
        Self::new(State(source), symbol, State(target))
    }
}

impl Show for Transition {
    fn show(&self) -> String {
        format!("({}, {}, {})", self.source, self.symbol, self.target)
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.show())
    }
}

/// The transition function of a DFA, stored as a map from `(state, symbol)` to the successor state.
///
/// Rules are kept in the order in which they were inserted, so the table can be written back
/// out in the same shape it was read. If two rules share a `(state, symbol)` pair, the one
/// inserted last determines the successor and the earlier one is recorded in
/// [`TransitionTable::overridden`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionTable {
    successors: Map<(State, char), State>,
    rules: Vec<Transition>,
    overridden: Vec<Transition>,
}

impl TransitionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the given rule. If a rule for the same `(state, symbol)` pair already exists, it is
    /// replaced and the previous target is returned.
    pub fn insert<T: Into<Transition>>(&mut self, transition: T) -> Option<State> {
        let transition = transition.into();
        let previous = self
            .successors
            .insert((transition.source, transition.symbol), transition.target);

        if let Some(old) = previous {
            let replaced = Transition::new(transition.source, transition.symbol, old);
            warn!(
                "rule {} overrides earlier rule {}",
                transition.show(),
                replaced.show()
            );
            self.overridden.push(replaced);
        }
        self.rules.push(transition);
        previous
    }

    /// Returns the state that is reached from `state` on `symbol`, if a rule for that pair exists.
    #[inline(always)]
    pub fn successor(&self, state: State, symbol: char) -> Option<State> {
        self.successors.get(&(state, symbol)).copied()
    }

    /// Number of distinct `(state, symbol)` pairs for which a rule exists.
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// Returns true if the table contains no rules.
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// All rules in insertion order, including those that were overridden later on.
    pub fn rules(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.rules.iter()
    }

    /// The effective rules, one per `(state, symbol)` pair, sorted by source state and symbol.
    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.successors
            .iter()
            .map(|(&(source, symbol), &target)| Transition::new(source, symbol, target))
            .sorted()
    }

    /// The rules that were replaced by a later rule for the same `(state, symbol)` pair.
    pub fn overridden(&self) -> &[Transition] {
        &self.overridden
    }

    /// Collects all pairs from `states` x `alphabet` for which no rule exists.
    pub fn missing<'a, I>(&self, states: I, alphabet: &CharAlphabet) -> Vec<(State, char)>
    where
        I: IntoIterator<Item = &'a State>,
    {
        states
            .into_iter()
            .cartesian_product(alphabet.universe().collect_vec())
            .filter(|(q, a)| !self.successors.contains_key(&(**q, *a)))
            .map(|(q, a)| (*q, a))
            .collect()
    }

    /// Returns true if there is a rule for every pair in `states` x `alphabet`.
    pub fn is_complete<'a, I>(&self, states: I, alphabet: &CharAlphabet) -> bool
    where
        I: IntoIterator<Item = &'a State>,
    {
        self.missing(states, alphabet).is_empty()
    }
}

impl<T: Into<Transition>> FromIterator<T> for TransitionTable {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        for transition in iter {
            table.insert(transition);
        }
        table
    }
}

impl<T: Into<Transition>> Extend<T> for TransitionTable {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for transition in iter {
            self.insert(transition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_and_transitions_display() {
        assert_eq!(State::new(4).to_string(), "q4");
        assert_eq!(Transition::from((1, 'a', 2)).to_string(), "(q1, a, q2)");
        assert_eq!(State::from(7).id(), 7);
    }

    #[test_log::test]
    fn last_rule_wins() {
        let mut table = TransitionTable::new();
        assert_eq!(table.insert((1, 'a', 2)), None);
        assert_eq!(table.insert((1, 'a', 3)), Some(State::new(2)));

        assert_eq!(table.successor(State::new(1), 'a'), Some(State::new(3)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules().count(), 2);
        assert_eq!(table.overridden(), &[Transition::from((1, 'a', 2))]);
    }

    #[test]
    fn completeness() {
        let table: TransitionTable = [(1, 'a', 2), (2, 'b', 1), (1, 'b', 1)].into_iter().collect();
        let states = [State::new(1), State::new(2)];
        let alphabet = CharAlphabet::from("ab");

        assert_eq!(table.missing(&states, &alphabet), vec![(State::new(2), 'a')]);
        assert!(!table.is_complete(&states, &alphabet));

        let mut total = table.clone();
        total.extend([(2, 'a', 2)]);
        assert!(total.is_complete(&states, &alphabet));
        assert_eq!(
            total.transitions().map(|t| t.to_string()).collect_vec(),
            vec!["(q1, a, q2)", "(q1, b, q1)", "(q2, a, q2)", "(q2, b, q1)"]
        );
    }
}
