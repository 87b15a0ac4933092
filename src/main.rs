//! x9kit CLI
//!
//! Command-line interface for generating, inspecting, repairing and converting X9.37
//! image cash letter files.
//!
//! # Usage
//!
//! ```bash
//! x9kit generate items.csv -o cashletter.x9
//! x9kit --config bank.toml generate --max-items-per-bundle 300 items.csv
//! x9kit read cashletter.x9
//! x9kit verify *.x9
//! x9kit --strategy async --max-concurrent 8 repair-trailers --output-dir fixed/ *.x9
//! x9kit repair-images cashletter.x9
//! x9kit ach --entry-class TRC entries.csv
//! x9kit x9-to-ach cashletter.x9
//! ```
//!
//! Logging goes to stderr at `warn` by default; `--verbose` raises it to `debug` and
//! `RUST_LOG` overrides both.
//!
//! # Exit Codes
//!
//! - 0: Every file processed
//! - 1: Invalid arguments or settings, or at least one file failed
//! - 2: `verify` found trailer mismatches

use std::process;
use tracing_subscriber::EnvFilter;
use x9_cashletter::cli::{self, CliArgs, Command};
use x9_cashletter::config::Settings;
use x9_cashletter::strategy::{self, FileOutcome};
use x9_cashletter::types::X9Error;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &CliArgs) -> Result<Settings, X9Error> {
    args.validate()?;
    let mut settings = Settings::load_or_default(args.config.as_deref())?;
    args.apply_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn report(outcomes: &[FileOutcome]) -> (usize, usize) {
    let mut failed = 0;
    let mut diagnostics = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(file) => {
                diagnostics += file.diagnostics.len();
                match &file.output {
                    Some(output) => println!(
                        "{}: {} -> {}",
                        file.input.display(),
                        file.count,
                        output.display()
                    ),
                    None => println!("{}: {}", file.input.display(), file.count),
                }
                for diagnostic in file.diagnostics.iter() {
                    eprintln!(
                        "{}: {:?}: {}",
                        file.input.display(),
                        diagnostic.resolution,
                        diagnostic.error
                    );
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: Error: {}", outcome.input.display(), e);
            }
        }
    }
    (failed, diagnostics)
}

fn main() {
    let args = cli::parse_args();
    init_tracing(args.verbose);

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let now = chrono::Local::now().naive_local();
    let operation = cli::build_operation(&args, &settings, now);

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    let outcomes = match strategy.process(args.command.inputs(), operation) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let (failed, diagnostics) = report(&outcomes);
    if failed > 0 {
        process::exit(1);
    }
    if diagnostics > 0 && matches!(args.command, Command::Verify { .. }) {
        process::exit(2);
    }
}
