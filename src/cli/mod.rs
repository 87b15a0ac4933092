// CLI module
// Command-line interface, argument parsing and operation selection

mod args;

pub use args::{CliArgs, Command, FileArgs, StrategyType, WriterOverrides};

use crate::config::Settings;
use crate::core::Generator;
use crate::strategy::{
    AchOperation, FileOperation, GenerateOperation, ListOperation, OutputPlan,
    RepairImagesOperation, RepairTrailersOperation, VerifyOperation, X9ToAchOperation,
};
use chrono::NaiveDateTime;
use clap::Parser;
use std::sync::Arc;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing subcommand, or --help), clap displays
/// an error message or help text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Build the file operation selected by the subcommand
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `settings` - Settings with the command-line overrides already applied
/// * `now` - Creation timestamp for generated headers
pub fn build_operation(
    args: &CliArgs,
    settings: &Settings,
    now: NaiveDateTime,
) -> Arc<dyn FileOperation> {
    let plan = OutputPlan {
        output: args.command.output().cloned(),
        output_dir: args.output_dir.clone(),
    };
    match &args.command {
        Command::Generate { .. } => Arc::new(GenerateOperation {
            generator: Generator::new(Arc::new(settings.writer_config()), settings.file.clone()),
            plan,
            now,
        }),
        Command::Read { .. } => Arc::new(ListOperation { plan }),
        Command::Verify { .. } => Arc::new(VerifyOperation),
        Command::RepairTrailers { .. } => Arc::new(RepairTrailersOperation { plan }),
        Command::RepairImages { .. } => Arc::new(RepairImagesOperation {
            plan,
            requirements: settings.images.clone().unwrap_or_default(),
        }),
        Command::Ach { .. } => Arc::new(AchOperation {
            config: settings.ach.clone(),
            plan,
            now,
        }),
        Command::X9ToAch { .. } => Arc::new(X9ToAchOperation {
            config: settings.ach.clone(),
            plan,
            now,
        }),
    }
}
