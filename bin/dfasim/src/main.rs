use std::process::ExitCode;

use dfa_sim::{
    config::{self, Config, FailurePolicy},
    pipeline,
    prelude::*,
};
use owo_colors::OwoColorize;

use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgAction, ArgMatches, Command};

/// Arguments that determine how the description is read and how the automaton behaves.
fn automaton_args() -> [Arg; 6] {
    [
        Arg::new("dfa")
            .long("dfa")
            .value_name("PATH")
            .default_value(config::DEFAULT_DESCRIPTOR_PATH)
            .help("file that describes the automaton"),
        Arg::new("layout")
            .long("layout")
            .default_value("auto")
            .value_parser(|s: &str| s.parse::<Layout>())
            .help("where the declarations are found: auto, positional, compact or sectioned"),
        Arg::new("marker")
            .long("marker")
            .default_value("q")
            .value_parser(clap::value_parser!(char))
            .help("character that introduces a state"),
        Arg::new("numbering")
            .long("numbering")
            .default_value("counted")
            .value_parser(|s: &str| s.parse::<StateNumbering>())
            .help("how declared states are numbered: counted or literal"),
        Arg::new("missing")
            .long("missing")
            .default_value("stall")
            .value_parser(|s: &str| s.parse::<MissingTransitionPolicy>())
            .help("what happens on an undefined transition: stall, reject or error"),
        Arg::new("validate")
            .long("validate")
            .default_value("none")
            .value_parser(|s: &str| s.parse::<Validation>())
            .help("checks the description has to pass: none, consistent or total"),
    ]
}

fn cli() -> clap::Command {
    Command::new("dfasim")
    .about("Simulates deterministic finite automata on finite words")
    .subcommand_required(true)
    .arg(
        Arg::new("verbosity")
        .short('v')
        .long("verbosity")
        .num_args(0..=1)
        .require_equals(true)
        .value_parser(["info", "debug", "trace"])
        .default_missing_value("info")
    )
    .subcommand(
        Command::new("run")
        .about("evaluates every word of the words file and writes one verdict per line to the output file")
        .args(automaton_args())
        .arg(
            Arg::new("words")
            .long("words")
            .value_name("PATH")
            .default_value(config::DEFAULT_WORDS_PATH)
        )
        .arg(
            Arg::new("output")
            .long("output")
            .value_name("PATH")
            .default_value(config::DEFAULT_OUTPUT_PATH)
        )
        .arg(
            Arg::new("strict")
            .long("strict")
            .action(ArgAction::SetTrue)
            .help("abort on the first failure instead of continuing with empty results")
        )
    )
    .subcommand(
        Command::new("check")
        .about("prints the verdict for each of the given words")
        .args(automaton_args())
        .arg(
            Arg::new("word")
            .value_name("WORD")
            .num_args(1..)
            .required(true)
        )
    )
    .subcommand(
        Command::new("show")
        .about("prints the transition table of the automaton")
        .args(automaton_args())
        .arg(
            Arg::new("format")
            .long("format")
            .default_value("table")
            .value_parser(["table", "sectioned", "positional"])
        )
    )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn config_from(matches: &ArgMatches) -> Config {
    let parse = ParseOptions::default()
        .with_layout(*matches.get_one::<Layout>("layout").expect("has default"))
        .with_marker(*matches.get_one::<char>("marker").expect("has default"))
        .with_numbering(
            *matches
                .get_one::<StateNumbering>("numbering")
                .expect("has default"),
        );
    let engine = EngineOptions::default()
        .with_missing(
            *matches
                .get_one::<MissingTransitionPolicy>("missing")
                .expect("has default"),
        )
        .with_validation(*matches.get_one::<Validation>("validate").expect("has default"));

    let mut config = Config::default()
        .with_descriptor_path(matches.get_one::<String>("dfa").expect("has default"))
        .with_parse_options(parse)
        .with_engine_options(engine);

    if let Some(words) = matches.try_get_one::<String>("words").ok().flatten() {
        config = config.with_words_path(words);
    }
    if let Some(output) = matches.try_get_one::<String>("output").ok().flatten() {
        config = config.with_output_path(output);
    }
    if matches.try_get_one::<bool>("strict").ok().flatten() == Some(&true) {
        config = config.with_failure_policy(FailurePolicy::Strict);
    }
    debug!("running with {config:?}");
    config
}

fn load(config: &Config) -> Option<Dfa> {
    match pipeline::load_dfa(config) {
        Ok(dfa) => Some(dfa),
        Err(e) => {
            error!("could not load automaton, {e}");
            None
        }
    }
}

fn run(config: &Config) -> ExitCode {
    let start = std::time::Instant::now();
    match pipeline::run(config) {
        Ok(report) => {
            info!(
                "evaluated {} words in {}µs",
                report.evaluations.len(),
                start.elapsed().as_micros()
            );
            for (stage, _) in &report.failures {
                warn!("{stage} failed, continued with an empty result");
            }
            if report.output_written {
                println!("Output file created. Exiting..");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("run aborted, {e}");
            ExitCode::FAILURE
        }
    }
}

fn check(config: &Config, words: Vec<&String>) -> ExitCode {
    let Some(dfa) = load(config) else {
        return ExitCode::FAILURE;
    };

    let mut code = ExitCode::SUCCESS;
    for word in words {
        match dfa.verdict(word) {
            Ok(Verdict::Accepted) => println!("{word} is {}.", Verdict::Accepted.green()),
            Ok(Verdict::Rejected) => println!("{word} is {}.", Verdict::Rejected.red()),
            Err(missing) => {
                println!("{word} could not be evaluated, {}", missing.yellow());
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}

fn show(config: &Config, format: &str) -> ExitCode {
    let Some(dfa) = load(config) else {
        return ExitCode::FAILURE;
    };

    match format {
        "sectioned" => print!("{}", dfa.descriptor()),
        "positional" => println!(
            "{}",
            dfa.descriptor().to_positional_text(&LineLayout::default())
        ),
        _ => println!("{dfa}"),
    }
    ExitCode::SUCCESS
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match matches.subcommand() {
        Some(("run", sub_matches)) => run(&config_from(sub_matches)),
        Some(("check", sub_matches)) => check(
            &config_from(sub_matches),
            sub_matches
                .get_many::<String>("word")
                .expect("is required")
                .collect(),
        ),
        Some(("show", sub_matches)) => show(
            &config_from(sub_matches),
            sub_matches
                .get_one::<String>("format")
                .expect("has default"),
        ),
        _ => unreachable!(),
    }
}
