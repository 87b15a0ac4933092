use crate::codec::{Charset, Framing};
use crate::config::{Settings, WriterConfig};
use crate::strategy::BatchConfig;
use crate::types::X9Error;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generate, inspect, repair and convert X9.37 image cash letter files
#[derive(Parser, Debug)]
#[command(name = "x9kit")]
#[command(about = "Generate, inspect, repair and convert X9.37 image cash letter files", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// TOML settings file
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Processing strategy to use for multiple input files
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        global = true,
        help = "Processing strategy: 'sync' for sequential or 'async' for parallel files"
    )]
    pub strategy: StrategyType,

    /// Number of files per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        global = true,
        help = "Number of files scheduled per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of files processed concurrently (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        global = true,
        help = "Maximum number of files processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Directory for derived output file names
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Toolkit subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build an exchange file from an item CSV
    Generate {
        #[command(flatten)]
        files: FileArgs,
        #[command(flatten)]
        writer: WriterOverrides,
    },
    /// List the records of exchange files as CSV
    Read {
        #[command(flatten)]
        files: FileArgs,
    },
    /// Recompute trailers and report mismatches
    Verify {
        /// Exchange files to check
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Rewrite trailers from recomputed totals
    RepairTrailers {
        #[command(flatten)]
        files: FileArgs,
    },
    /// Correct image size fields and repair non-conforming images
    RepairImages {
        #[command(flatten)]
        files: FileArgs,
    },
    /// Assemble an ACH file from a transaction CSV
    Ach {
        #[command(flatten)]
        files: FileArgs,
        /// Standard entry class applied to every entry
        #[arg(long = "entry-class", value_name = "SEC")]
        entry_class: Option<String>,
    },
    /// Convert the check details of exchange files into ACH files
    X9ToAch {
        #[command(flatten)]
        files: FileArgs,
        /// Standard entry class applied to every entry
        #[arg(long = "entry-class", value_name = "SEC")]
        entry_class: Option<String>,
    },
}

/// Inputs and an optional explicit output
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FileArgs {
    /// Input files
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file; only valid with a single input
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Writer settings that override the configuration file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct WriterOverrides {
    /// Character set of text fields
    #[arg(long = "charset", value_name = "CHARSET")]
    pub charset: Option<Charset>,

    /// Record framing
    #[arg(long = "framing", value_name = "FRAMING")]
    pub framing: Option<Framing>,

    /// Close each bundle after this many items
    #[arg(long = "max-items-per-bundle", value_name = "COUNT")]
    pub max_items_per_bundle: Option<usize>,

    /// Repair images that do not meet the requirements
    #[arg(long = "repair-images")]
    pub repair_images: bool,
}

impl WriterOverrides {
    /// Apply the given flags on top of `config`
    pub fn apply(&self, config: &mut WriterConfig) {
        if let Some(charset) = self.charset {
            config.charset = charset;
        }
        if let Some(framing) = self.framing {
            config.framing = framing;
        }
        if self.max_items_per_bundle.is_some() {
            config.max_items_per_bundle = self.max_items_per_bundle;
        }
        if self.repair_images {
            config.repair_images = true;
        }
    }
}

impl Command {
    /// Input files of the subcommand
    pub fn inputs(&self) -> &[PathBuf] {
        match self {
            Command::Verify { inputs } => inputs,
            Command::Generate { files, .. }
            | Command::Read { files }
            | Command::RepairTrailers { files }
            | Command::RepairImages { files }
            | Command::Ach { files, .. }
            | Command::X9ToAch { files, .. } => &files.inputs,
        }
    }

    /// Explicit output file of the subcommand, if any
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Command::Verify { .. } => None,
            Command::Generate { files, .. }
            | Command::Read { files }
            | Command::RepairTrailers { files }
            | Command::RepairImages { files }
            | Command::Ach { files, .. }
            | Command::X9ToAch { files, .. } => files.output.as_ref(),
        }
    }
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values fall back with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Check argument combinations clap cannot express
    ///
    /// # Errors
    ///
    /// `ConfigError` when an explicit output is combined with several inputs.
    pub fn validate(&self) -> Result<(), X9Error> {
        if self.command.output().is_some() && self.command.inputs().len() > 1 {
            return Err(X9Error::config(
                "--output requires a single input; use --output-dir for several",
            ));
        }
        Ok(())
    }

    /// Apply the command-line overrides to loaded settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        match &self.command {
            Command::Generate { writer, .. } => writer.apply(&mut settings.writer),
            Command::Ach {
                entry_class: Some(sec),
                ..
            }
            | Command::X9ToAch {
                entry_class: Some(sec),
                ..
            } => settings.ach.entry_class = sec.to_ascii_uppercase(),
            _ => {}
        }
    }
}
