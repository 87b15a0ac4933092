//! Processing strategy module for file operations
//!
//! This module defines the Strategy pattern for running one file operation (generate,
//! verify, repair, convert) over many input files. Each file is processed completely
//! independently, with its own writer and accumulators, so files can run in parallel
//! without shared mutable state. Different implementations (sequential, asynchronous
//! batch) are selected at runtime.

use crate::cli::StrategyType;
use crate::types::{Diagnostics, X9Error};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod r#async;
pub mod operations;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use operations::{
    AchOperation, GenerateOperation, ListOperation, OutputPlan, RepairImagesOperation,
    RepairTrailersOperation, VerifyOperation, X9ToAchOperation,
};
pub use sync::SyncProcessingStrategy;

/// Result of one successfully processed file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// File the operation read
    pub input: PathBuf,
    /// File the operation wrote, if any
    pub output: Option<PathBuf>,
    /// Records, items or entries handled, depending on the operation
    pub count: u64,
    /// Recoverable conditions found in this file
    pub diagnostics: Diagnostics,
}

/// Outcome of one input, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<FileReport, X9Error>,
}

/// One operation applied to a single input file
///
/// Implementations hold only immutable settings, so one instance can be shared by
/// every worker.
pub trait FileOperation: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Process one input file
    ///
    /// # Errors
    ///
    /// Any fatal error of this file. Other files are not affected.
    fn run(&self, input: &Path) -> Result<FileReport, X9Error>;
}

/// Processing strategy trait for running a file operation over many inputs
pub trait ProcessingStrategy: Send + Sync {
    /// Run `operation` over every input
    ///
    /// # Arguments
    ///
    /// * `inputs` - Input files, processed independently
    /// * `operation` - The operation to apply to each file
    ///
    /// # Returns
    ///
    /// One outcome per input, in input order
    ///
    /// # Errors
    ///
    /// Only failures of the strategy itself (e.g. the runtime cannot be created);
    /// per-file failures are reported in the outcomes.
    fn process(
        &self,
        inputs: &[PathBuf],
        operation: Arc<dyn FileOperation>,
    ) -> Result<Vec<FileOutcome>, X9Error>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
