use std::{
    fmt::Display,
    io::{BufRead, Write},
};

use tracing::{debug, trace};

use crate::prelude::*;

/// The outcome of a single membership query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The word ends in an accepting state.
    Accepted,
    /// The word does not end in an accepting state.
    Rejected,
}

impl Verdict {
    /// Returns true for [`Verdict::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

/// A word together with its [`Verdict`]. Displays as one line of the result file, e.g.
/// `ab is rejected.`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evaluation {
    /// The word that was evaluated.
    pub word: String,
    /// The verdict of the automaton.
    pub verdict: Verdict,
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is {}.", self.word, self.verdict)
    }
}

/// Evaluates every word in order. Stops at the first undefined transition if `dfa` uses
/// [`MissingTransitionPolicy::Error`].
pub fn evaluate<I, S>(dfa: &Dfa, words: I) -> Result<Vec<Evaluation>, MissingTransition>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    words
        .into_iter()
        .map(|word| {
            let word = word.into();
            let verdict = dfa.verdict(&word)?;
            trace!("\"{word}\" is {verdict}");
            Ok(Evaluation { word, verdict })
        })
        .collect()
}

/// Reads one word per line. Line endings (`\n` or `\r\n`) are not part of the words, no other
/// processing takes place, so an empty line is the empty word.
pub fn read_words<R: BufRead>(read: R) -> std::io::Result<Vec<String>> {
    let words = read.lines().collect::<std::io::Result<Vec<_>>>()?;
    debug!("read {} words", words.len());
    Ok(words)
}

/// Writes one line per evaluation, in the given order.
pub fn write_evaluations<'a, W, I>(mut write: W, evaluations: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Evaluation>,
{
    for evaluation in evaluations {
        writeln!(write, "{evaluation}")?;
    }
    write.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::toggle_dfa;

    #[test_log::test]
    fn batch_keeps_order() {
        let evaluations = evaluate(&toggle_dfa(), ["a", "ab", "", "aa"]).unwrap();
        let mut out = vec![];
        write_evaluations(&mut out, &evaluations).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a is accepted.\nab is rejected.\n is rejected.\naa is accepted.\n"
        );
    }

    #[test]
    fn batch_with_error_policy() {
        let dfa = Dfa::with_options(
            toggle_dfa().into_descriptor(),
            EngineOptions::default().with_missing(MissingTransitionPolicy::Error),
        )
        .unwrap();
        assert_eq!(
            evaluate(&dfa, ["a", "aa"]),
            Err(MissingTransition {
                position: 1,
                state: State::new(2),
                symbol: 'a'
            })
        );
    }

    #[test]
    fn reading_words() {
        let words = read_words("a\r\nab\n\naa\n".as_bytes()).unwrap();
        assert_eq!(words, vec!["a", "ab", "", "aa"]);
        assert!(read_words("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn verdicts() {
        assert_eq!(Verdict::from(true), Verdict::Accepted);
        assert!(!Verdict::from(false).is_accepted());
        let evaluation = Evaluation {
            word: "abba".to_string(),
            verdict: Verdict::Rejected,
        };
        assert_eq!(evaluation.to_string(), "abba is rejected.");
    }
}
