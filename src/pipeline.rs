use std::{
    fmt::Display,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{batch, config::Config, config::FailurePolicy, prelude::*};

/// The stages of a run, in the order in which they are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Reading, parsing and validating the description.
    Descriptor,
    /// Reading the words file.
    Words,
    /// Evaluating the words.
    Evaluation,
    /// Writing the result file.
    Output,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Stage::Descriptor => "loading the automaton",
                Stage::Words => "reading the words",
                Stage::Evaluation => "evaluating the words",
                Stage::Output => "writing the results",
            }
        )
    }
}

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PipelineError {
    #[error("could not access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed description: {0}")]
    Descriptor(#[from] DescriptorFormatError),
    #[error("invalid automaton: {0}")]
    Semantic(#[from] SemanticError),
    #[error("could not evaluate word: {0}")]
    Evaluation(#[from] MissingTransition),
}

impl PipelineError {
    fn io<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| PipelineError::Io { path, source }
    }
}

/// Summarizes what a [`run`] did. Under [`FailurePolicy::Permissive`] the failures of all stages
/// are collected here, so a words file that could not be read can be told apart from one that
/// contains no words.
#[derive(Debug, Default)]
pub struct Report {
    /// The evaluated words in input order.
    pub evaluations: Vec<Evaluation>,
    /// Whether the result file was written.
    pub output_written: bool,
    /// Every stage that failed together with its error.
    pub failures: Vec<(Stage, PipelineError)>,
}

impl Report {
    /// Returns true if no stage failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true if the given stage failed.
    pub fn failed(&self, stage: Stage) -> bool {
        self.failures.iter().any(|(failed, _)| *failed == stage)
    }

    fn settle<T>(
        &mut self,
        policy: FailurePolicy,
        stage: Stage,
        result: Result<T, PipelineError>,
    ) -> Result<Option<T>, PipelineError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if policy.is_strict() => Err(e),
            Err(e) => {
                error!("{stage} failed, {e}");
                self.failures.push((stage, e));
                Ok(None)
            }
        }
    }
}

/// Reads and parses the description file and builds the automaton as configured.
pub fn load_dfa(config: &Config) -> Result<Dfa, PipelineError> {
    let text = std::fs::read_to_string(&config.descriptor_path)
        .map_err(PipelineError::io(&config.descriptor_path))?;
    let descriptor = DescriptorParser::new(config.parse).parse_str(&text)?;
    let dfa = Dfa::with_options(descriptor, config.engine)?;
    info!(
        "loaded automaton with {} states and {} rules from {}",
        dfa.descriptor().states().len(),
        dfa.descriptor().transitions().len(),
        config.descriptor_path.display()
    );
    Ok(dfa)
}

/// Reads the words file at `path`, one word per line.
pub fn load_words<P: AsRef<Path>>(path: P) -> Result<Vec<String>, PipelineError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(PipelineError::io(path))?;
    batch::read_words(BufReader::new(file)).map_err(PipelineError::io(path))
}

/// Creates or truncates the file at `path` and writes one line per evaluation.
pub fn write_output<P: AsRef<Path>>(
    path: P,
    evaluations: &[Evaluation],
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(PipelineError::io(path))?;
    batch::write_evaluations(BufWriter::new(file), evaluations).map_err(PipelineError::io(path))
}

/// Loads the automaton, evaluates every word of the words file and writes the result file.
///
/// With [`FailurePolicy::Strict`] the first failing stage aborts the run. With
/// [`FailurePolicy::Permissive`] a failing stage is logged and replaced by an empty result, the
/// run continues and the returned [`Report`] lists what went wrong. Without an automaton no word
/// can be evaluated, so the result file ends up empty in that case.
pub fn run(config: &Config) -> Result<Report, PipelineError> {
    let policy = config.failure;
    let mut report = Report::default();

    let dfa = report.settle(policy, Stage::Descriptor, load_dfa(config))?;
    let words = report
        .settle(policy, Stage::Words, load_words(&config.words_path))?
        .unwrap_or_default();

    let evaluations = match &dfa {
        Some(dfa) => report
            .settle(
                policy,
                Stage::Evaluation,
                batch::evaluate(dfa, words).map_err(PipelineError::from),
            )?
            .unwrap_or_default(),
        None => {
            if !words.is_empty() {
                warn!("no automaton available, skipping {} words", words.len());
            }
            vec![]
        }
    };

    report.output_written = report
        .settle(
            policy,
            Stage::Output,
            write_output(&config.output_path, &evaluations),
        )?
        .is_some();
    report.evaluations = evaluations;

    if report.output_written {
        info!(
            "wrote {} verdicts to {}",
            report.evaluations.len(),
            config.output_path.display()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const DESCRIPTION: &str = "states: {q1, q2}
alphabet: {a, b}
start: q1
accepting: {q2}
transitions:
  (q1, a, q2)
  (q2, b, q1)
";

    fn setup(dir: &Path, words: Option<&str>) -> Config {
        std::fs::write(dir.join("dfa.txt"), DESCRIPTION).unwrap();
        if let Some(words) = words {
            std::fs::write(dir.join("words.txt"), words).unwrap();
        }
        Config::default()
            .with_descriptor_path(dir.join("dfa.txt"))
            .with_words_path(dir.join("words.txt"))
            .with_output_path(dir.join("answers.txt"))
    }

    fn output(config: &Config) -> String {
        std::fs::read_to_string(&config.output_path).unwrap()
    }

    #[test_log::test]
    fn complete_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), Some("a\nab\n\naa\n"));

        let report = run(&config).unwrap();
        assert!(report.is_clean());
        assert!(report.output_written);
        assert_eq!(report.evaluations.len(), 4);
        assert_eq!(
            output(&config),
            "a is accepted.\nab is rejected.\n is rejected.\naa is accepted.\n"
        );
    }

    #[test_log::test]
    fn permissive_without_words() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), None);

        let report = run(&config).unwrap();
        assert!(report.failed(Stage::Words));
        assert!(!report.failed(Stage::Descriptor));
        assert!(report.output_written);
        assert_eq!(output(&config), "");
    }

    #[test_log::test]
    fn empty_words_file_is_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), Some(""));

        let report = run(&config).unwrap();
        assert!(report.is_clean());
        assert!(report.evaluations.is_empty());
        assert_eq!(output(&config), "");
    }

    #[test_log::test]
    fn strict_without_words() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), None).with_failure_policy(FailurePolicy::Strict);

        match run(&config) {
            Err(PipelineError::Io { path, .. }) => assert_eq!(path, config.words_path),
            other => panic!("expected an io error, got {other:?}"),
        }
        assert!(!config.output_path.exists());
    }

    #[test_log::test]
    fn permissive_with_broken_description() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), Some("a\nb\n"));
        std::fs::write(&config.descriptor_path, "states: {q1}\nalphabet: {a}\n").unwrap();

        let report = run(&config).unwrap();
        assert!(report.failed(Stage::Descriptor));
        assert!(matches!(
            report.failures[0].1,
            PipelineError::Descriptor(DescriptorFormatError::MissingLine { .. })
        ));
        assert!(report.evaluations.is_empty());
        assert_eq!(output(&config), "");
    }

    #[test_log::test]
    fn permissive_with_failing_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), Some("a\naa\nab\n")).with_engine_options(
            EngineOptions::default().with_missing(MissingTransitionPolicy::Error),
        );

        let report = run(&config).unwrap();
        assert!(report.failed(Stage::Evaluation));
        assert!(!report.failed(Stage::Words));
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].1,
            PipelineError::Evaluation(MissingTransition {
                position: 1,
                symbol: 'a',
                ..
            })
        ));
        assert!(report.evaluations.is_empty());
        assert!(report.output_written);
        assert_eq!(output(&config), "");
    }

    #[test_log::test]
    fn strict_validation_and_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), Some("a\naa\n")).with_failure_policy(FailurePolicy::Strict);

        let total = config
            .clone()
            .with_engine_options(EngineOptions::default().with_validation(Validation::Total));
        assert!(matches!(
            run(&total),
            Err(PipelineError::Semantic(SemanticError::Incomplete(_)))
        ));

        let erroring = config.with_engine_options(
            EngineOptions::default().with_missing(MissingTransitionPolicy::Error),
        );
        assert!(matches!(
            run(&erroring),
            Err(PipelineError::Evaluation(MissingTransition { position: 1, .. }))
        ));
    }

    #[test]
    fn error_messages() {
        let error = PipelineError::Io {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(error.to_string().starts_with("could not access `missing.txt`: "));
        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(Stage::Words.to_string(), "reading the words");
    }
}
