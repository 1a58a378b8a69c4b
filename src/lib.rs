//! Library for simulating deterministic finite automata (DFA) that are given in a small text format.
//!
//! A DFA is described by its states, an alphabet of single characters, a start state, a set of
//! accepting states and a transition table. The [`descriptor::parser`] turns the description text
//! into a [`Descriptor`], which is immutable from then on. A [`Dfa`] takes ownership of such a
//! descriptor and answers membership queries for arbitrary finite words through [`Dfa::accepts`].
//!
//! The description text can either follow the fixed positional layout where every declaration sits
//! on a known line (see [`descriptor::LineLayout`]), or a sectioned layout where each declaration is
//! introduced by a named header. Both are handled by the same [`DescriptorParser`].
//!
//! What happens when a word uses a `(state, symbol)` pair for which no rule exists is decided by a
//! [`MissingTransitionPolicy`]. The default is to stall, i.e. stay in the current state and continue
//! with the next symbol.
//!
//! The modules [`batch`], [`config`] and [`pipeline`] contain the glue for reading test words from a
//! file, evaluating them and writing one verdict line per word.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use dfa_sim::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::CharAlphabet,
        automaton::{Dfa, EngineOptions, MissingTransitionPolicy, Validation},
        batch::{Evaluation, Verdict},
        descriptor::{
            parser::{DescriptorFormatError, DescriptorParser, Field, ParseOptions, StateNumbering},
            Descriptor, DescriptorBuilder, Layout, LineLayout, SemanticError,
        },
        math,
        transition_system::{
            run::{MissingTransition, Run},
            State, Transition, TransitionTable,
        },
        word::FiniteWord,
        Show,
    };
}

/// Type aliases for the collections used throughout the crate.
pub mod math;

/// Module that contains the definition of [`alphabet::CharAlphabet`].
pub mod alphabet;

/// Finite words, i.e. finite sequences of symbols that can be fed into an automaton.
pub mod word;

/// States, transitions and the transition table.
pub mod transition_system;

/// The structured representation of a DFA, its construction and validation.
pub mod descriptor;
pub use descriptor::{parser::DescriptorParser, Descriptor};

/// Defines the automaton engine that answers membership queries.
pub mod automaton;
pub use automaton::{Dfa, MissingTransitionPolicy};

/// Evaluation of whole batches of words and the text formats for reading and writing them.
pub mod batch;

/// Configuration of a complete run.
pub mod config;

/// Ties parsing, evaluation and output together.
pub mod pipeline;

/// Implements the generation of random descriptors. This is feature gated behind the `random` feature.
#[cfg(feature = "random")]
pub mod random;

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state that should be
    /// for example q0, q1, q2, ... and for a transition (q0, a, q1) it should be (q0, a, q1).
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of states this should be {q0, q1, q2, ...}.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!(
            "{{{}}}",
            itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
        )
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// The two state automaton used throughout the tests: it accepts after an `a`
    /// and falls back to the start on `b`.
    pub fn toggle_dfa() -> Dfa {
        DescriptorBuilder::default()
            .with_states(1..=2)
            .with_alphabet(['a', 'b'])
            .with_accepting([2])
            .with_transitions([(1, 'a', 2), (2, 'b', 1)])
            .into_dfa(1)
    }

    /// Accepts exactly the words over `{a, b}` that contain an even number of `a`s.
    pub fn even_a_dfa() -> Dfa {
        DescriptorBuilder::default()
            .with_states(1..=2)
            .with_alphabet(['a', 'b'])
            .with_accepting([1])
            .with_transitions([(1, 'a', 2), (1, 'b', 1), (2, 'a', 1), (2, 'b', 2)])
            .into_dfa(1)
    }

    #[test]
    fn show_collections() {
        assert_eq!(vec![State::new(1), State::new(3)].show(), "{q1, q3}");
        assert_eq!(['a', 'b'].show(), "{a, b}");
    }

    #[test_log::test]
    fn concrete_scenario() {
        let dfa = toggle_dfa();
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("ab"));
        assert!(!dfa.accepts(""));
        assert!(dfa.accepts("aa"));

        let parity = even_a_dfa();
        assert!(parity.accepts(""));
        assert!(parity.accepts("abba"));
        assert!(!parity.accepts("bab"));
    }
}
