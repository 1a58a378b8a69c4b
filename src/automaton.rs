use std::fmt::Display;

use tracing::{debug, trace, warn};

use crate::prelude::*;

pub use crate::descriptor::Validation;

/// Decides what happens when a word asks for a `(state, symbol)` pair that has no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MissingTransitionPolicy {
    /// Stay in the current state and continue with the next symbol.
    #[default]
    Stall,
    /// Reject the word immediately.
    Reject,
    /// Abort the query with a [`MissingTransition`] error.
    Error,
}

impl std::str::FromStr for MissingTransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stall" => Ok(Self::Stall),
            "reject" => Ok(Self::Reject),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown missing transition policy `{other}`")),
        }
    }
}

impl std::str::FromStr for Validation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "consistent" => Ok(Self::Consistent),
            "total" => Ok(Self::Total),
            other => Err(format!("unknown validation level `{other}`")),
        }
    }
}

/// Options that are fixed when a [`Dfa`] is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct EngineOptions {
    /// What to do with undefined transitions.
    pub missing: MissingTransitionPolicy,
    /// Which checks the descriptor has to pass.
    pub validation: Validation,
}

impl EngineOptions {
    /// Sets the policy for undefined transitions.
    pub fn with_missing(self, missing: MissingTransitionPolicy) -> Self {
        Self { missing, ..self }
    }

    /// Sets the validation level.
    pub fn with_validation(self, validation: Validation) -> Self {
        Self { validation, ..self }
    }
}

/// The outcome of reading one symbol.
#[derive(Debug, Clone, Copy)]
enum Step {
    Move(State),
    Stall(MissingTransition),
    Reject(MissingTransition),
}

/// A deterministic finite automaton, which owns its [`Descriptor`] and answers membership
/// queries for finite words.
///
/// Queries do not modify the automaton, so a single instance can be shared between threads
/// and asked about any number of words in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    descriptor: Descriptor,
    policy: MissingTransitionPolicy,
}

impl Dfa {
    /// Creates an automaton from the given descriptor without checking it. Undefined transitions
    /// stall.
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            policy: MissingTransitionPolicy::default(),
        }
    }

    /// Checks the descriptor as requested by `options` and creates an automaton from it.
    pub fn with_options(
        descriptor: Descriptor,
        options: EngineOptions,
    ) -> Result<Self, SemanticError> {
        descriptor.validate(options.validation)?;
        debug!(
            "descriptor passed {:?} validation, missing transitions are handled by {:?}",
            options.validation, options.missing
        );
        Ok(Self {
            descriptor,
            policy: options.missing,
        })
    }

    /// Returns a reference to the underlying descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Consumes the automaton and returns its descriptor.
    pub fn into_descriptor(self) -> Descriptor {
        self.descriptor
    }

    /// Returns the policy for undefined transitions.
    pub fn policy(&self) -> MissingTransitionPolicy {
        self.policy
    }

    /// Reads a single symbol in `current` and applies the policy if there is no rule for it.
    fn step(
        &self,
        position: usize,
        current: State,
        symbol: char,
    ) -> Result<Step, MissingTransition> {
        if let Some(next) = self.descriptor.transitions().successor(current, symbol) {
            return Ok(Step::Move(next));
        }
        let missing = MissingTransition {
            position,
            state: current,
            symbol,
        };
        match self.policy {
            MissingTransitionPolicy::Stall => {
                trace!("stalling, {missing}");
                Ok(Step::Stall(missing))
            }
            MissingTransitionPolicy::Reject => {
                trace!("rejecting, {missing}");
                Ok(Step::Reject(missing))
            }
            MissingTransitionPolicy::Error => Err(missing),
        }
    }

    /// Returns the state that is reached after reading `word` from the start state, or `None`
    /// if the word was rejected on the way by [`MissingTransitionPolicy::Reject`].
    pub fn reached_state<W: FiniteWord>(
        &self,
        word: W,
    ) -> Result<Option<State>, MissingTransition> {
        let mut current = self.descriptor.start();
        for (position, symbol) in word.symbols().enumerate() {
            match self.step(position, current, symbol)? {
                Step::Move(next) => current = next,
                Step::Stall(_) => {}
                Step::Reject(_) => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Returns whether the automaton accepts `word`, surfacing undefined transitions under
    /// [`MissingTransitionPolicy::Error`].
    pub fn try_accepts<W: FiniteWord>(&self, word: W) -> Result<bool, MissingTransition> {
        Ok(self
            .reached_state(word)?
            .is_some_and(|state| self.descriptor.is_accepting(state)))
    }

    /// Returns whether the automaton accepts `word`. The empty word is accepted if and only if
    /// the start state is accepting.
    ///
    /// Under [`MissingTransitionPolicy::Error`], a word that hits an undefined transition is
    /// logged and counts as rejected, use [`Dfa::try_accepts`] to get hold of the error.
    pub fn accepts<W: FiniteWord>(&self, word: W) -> bool {
        match self.try_accepts(word) {
            Ok(accepted) => accepted,
            Err(missing) => {
                warn!("treating word as rejected, {missing}");
                false
            }
        }
    }

    /// Classifies `word` as accepted or rejected.
    pub fn verdict<W: FiniteWord>(&self, word: W) -> Result<Verdict, MissingTransition> {
        self.try_accepts(word).map(Verdict::from)
    }

    /// Reads `word` and records every visited state as well as every position at which no rule
    /// was defined. Under [`MissingTransitionPolicy::Reject`] the run stops at the first such
    /// position.
    pub fn run<W: FiniteWord>(&self, word: W) -> Result<Run, MissingTransition> {
        let mut run = Run::starting_in(self.descriptor.start());
        for (position, symbol) in word.symbols().enumerate() {
            match self.step(position, run.reached(), symbol)? {
                Step::Move(next) => run.push(next),
                Step::Stall(missing) => run.stall(missing),
                Step::Reject(missing) => {
                    run.die(missing);
                    break;
                }
            }
        }
        Ok(run)
    }
}

impl From<Descriptor> for Dfa {
    fn from(value: Descriptor) -> Self {
        Self::new(value)
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor.render_table())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::tests::{even_a_dfa, toggle_dfa};

    fn toggle_with(missing: MissingTransitionPolicy) -> Dfa {
        Dfa::with_options(
            toggle_dfa().into_descriptor(),
            EngineOptions::default().with_missing(missing),
        )
        .unwrap()
    }

    #[test_log::test]
    fn stall_policy() {
        let dfa = toggle_dfa();
        assert_eq!(dfa.policy(), MissingTransitionPolicy::Stall);
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("ab"));
        assert!(!dfa.accepts(""));
        // the second `a` has no rule in q2, so the run stays there
        assert!(dfa.accepts("aa"));
        assert_eq!(dfa.reached_state("aa"), Ok(Some(State::new(2))));
        // symbols outside of the alphabet stall as well
        assert!(dfa.accepts("ac"));
        assert!(!dfa.accepts("b"));
    }

    #[test_log::test]
    fn reject_policy() {
        let dfa = toggle_with(MissingTransitionPolicy::Reject);
        assert!(dfa.accepts("a"));
        assert!(dfa.accepts("aba"));
        assert!(!dfa.accepts("aa"));
        assert_eq!(dfa.reached_state("aa"), Ok(None));

        let run = dfa.run("aab").unwrap();
        assert!(!run.completed());
        assert_eq!(run.states(), &[State::new(1), State::new(2)]);
        assert_eq!(
            run.dead(),
            Some(&MissingTransition {
                position: 1,
                state: State::new(2),
                symbol: 'a'
            })
        );
    }

    #[test_log::test]
    fn error_policy() {
        let dfa = toggle_with(MissingTransitionPolicy::Error);
        let missing = MissingTransition {
            position: 1,
            state: State::new(2),
            symbol: 'a',
        };
        assert_eq!(dfa.try_accepts("aa"), Err(missing));
        assert_eq!(dfa.run("aa"), Err(missing));
        assert_eq!(dfa.verdict("aa"), Err(missing));
        assert!(!dfa.accepts("aa"));
        assert_eq!(dfa.verdict("a"), Ok(Verdict::Accepted));
    }

    #[test]
    fn empty_word_depends_on_start_only() {
        for policy in [
            MissingTransitionPolicy::Stall,
            MissingTransitionPolicy::Reject,
            MissingTransitionPolicy::Error,
        ] {
            assert!(!toggle_with(policy).accepts(""));
        }
        assert!(even_a_dfa().accepts(""));
        assert_eq!(toggle_dfa().run("").unwrap().states(), &[State::new(1)]);
    }

    #[test]
    fn queries_are_repeatable() {
        let dfa = even_a_dfa();
        for word in ["", "a", "ab", "aab", "babab", "bbbb"] {
            let first = dfa.accepts(word);
            assert_eq!(first, dfa.accepts(word));
            assert_eq!(first, word.matches('a').count() % 2 == 0);
        }
    }

    #[test]
    fn different_word_types() {
        let dfa = toggle_dfa();
        let owned = String::from("aba");
        assert!(dfa.accepts(&owned));
        assert!(dfa.accepts(owned));
        assert!(dfa.accepts(['a']));
        assert!(!dfa.accepts(vec!['a', 'b']));
        assert!(dfa.accepts(&['a', 'b', 'a'][..]));
    }

    #[test_log::test]
    fn validation_on_construction() {
        let descriptor = toggle_dfa().into_descriptor();
        assert!(Dfa::with_options(
            descriptor.clone(),
            EngineOptions::default().with_validation(Validation::Consistent)
        )
        .is_ok());
        assert!(matches!(
            Dfa::with_options(
                descriptor,
                EngineOptions::default().with_validation(Validation::Total)
            ),
            Err(SemanticError::Incomplete(_))
        ));
    }

    #[test]
    fn shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dfa>();

        let dfa = &even_a_dfa();
        let words = ["", "a", "aa", "aba", "bab", "aaa"];
        let verdicts: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = words
                .iter()
                .map(|word| scope.spawn(move || dfa.accepts(*word)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });
        assert_eq!(verdicts, vec![true, false, true, true, false, false]);
    }

    #[test_log::test]
    fn runs_and_reached_states_agree() {
        for policy in [
            MissingTransitionPolicy::Stall,
            MissingTransitionPolicy::Reject,
            MissingTransitionPolicy::Error,
        ] {
            let dfa = toggle_with(policy);
            for word in ["", "a", "ab", "aab", "aba", "b", "abba", "ac"] {
                let expected = dfa.run(word).map(|run| run.completed().then(|| run.reached()));
                assert_eq!(dfa.reached_state(word), expected, "{policy:?} on {word:?}");
            }
        }
    }

    #[test]
    fn policy_from_str() {
        assert_eq!(
            "Reject".parse::<MissingTransitionPolicy>(),
            Ok(MissingTransitionPolicy::Reject)
        );
        assert_eq!("total".parse::<Validation>(), Ok(Validation::Total));
        assert!("skip".parse::<MissingTransitionPolicy>().is_err());
    }

    #[test]
    fn display_renders_table() {
        let shown = toggle_dfa().to_string();
        assert!(shown.contains("-> q1"));
        assert!(shown.contains("q2 *"));
    }
}
