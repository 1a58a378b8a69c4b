use std::path::PathBuf;

use crate::prelude::*;

/// Default location of the description file.
pub const DEFAULT_DESCRIPTOR_PATH: &str = "COSC485_P1_DFA.txt";
/// Default location of the file with the words to evaluate.
pub const DEFAULT_WORDS_PATH: &str = "COSC485_P1_StringsDFA.txt";
/// Default location of the result file.
pub const DEFAULT_OUTPUT_PATH: &str = "COSC485_P1_AnswersDFA.txt";

/// Determines how a [`crate::pipeline::run`] reacts to a stage that fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FailurePolicy {
    /// Log the failure, continue with an empty result for the failed stage and record it in the
    /// [`crate::pipeline::Report`].
    #[default]
    Permissive,
    /// Stop at the first failure and return it.
    Strict,
}

impl FailurePolicy {
    /// Returns true for [`FailurePolicy::Strict`].
    pub fn is_strict(&self) -> bool {
        matches!(self, FailurePolicy::Strict)
    }
}

/// Everything a run needs to know: where to read from and write to, how to parse the description
/// and how the automaton treats it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the description file.
    pub descriptor_path: PathBuf,
    /// Path of the file with one word per line.
    pub words_path: PathBuf,
    /// Path of the result file, it is created or truncated.
    pub output_path: PathBuf,
    /// Options for the [`DescriptorParser`].
    pub parse: ParseOptions,
    /// Options for constructing the [`Dfa`].
    pub engine: EngineOptions,
    /// Reaction to failing stages.
    pub failure: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            descriptor_path: DEFAULT_DESCRIPTOR_PATH.into(),
            words_path: DEFAULT_WORDS_PATH.into(),
            output_path: DEFAULT_OUTPUT_PATH.into(),
            parse: ParseOptions::default(),
            engine: EngineOptions::default(),
            failure: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Sets the path of the description file.
    pub fn with_descriptor_path<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            descriptor_path: path.into(),
            ..self
        }
    }

    /// Sets the path of the words file.
    pub fn with_words_path<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            words_path: path.into(),
            ..self
        }
    }

    /// Sets the path of the result file.
    pub fn with_output_path<P: Into<PathBuf>>(self, path: P) -> Self {
        Self {
            output_path: path.into(),
            ..self
        }
    }

    /// Replaces the parser options.
    pub fn with_parse_options(self, parse: ParseOptions) -> Self {
        Self { parse, ..self }
    }

    /// Replaces the engine options.
    pub fn with_engine_options(self, engine: EngineOptions) -> Self {
        Self { engine, ..self }
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(self, failure: FailurePolicy) -> Self {
        Self { failure, ..self }
    }
}
