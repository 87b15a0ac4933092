//! Synchronous processing strategy
//!
//! Runs a file operation over each input in turn on the calling thread.
//!
//! # Design
//!
//! The SyncProcessingStrategy only orchestrates; reading, writing and reconciliation
//! all live in the operation. A failed file is recorded and the next file starts
//! from a clean state.

use crate::strategy::{FileOperation, FileOutcome, ProcessingStrategy};
use crate::types::X9Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use x9_cashletter::strategy::{ProcessingStrategy, SyncProcessingStrategy, VerifyOperation};
/// use std::path::PathBuf;
/// use std::sync::Arc;
///
/// let outcomes = SyncProcessingStrategy
///     .process(&[PathBuf::from("cashletter.x9")], Arc::new(VerifyOperation))
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        inputs: &[PathBuf],
        operation: Arc<dyn FileOperation>,
    ) -> Result<Vec<FileOutcome>, X9Error> {
        let outcomes: Vec<FileOutcome> = inputs
            .iter()
            .map(|input| {
                let result = operation.run(input);
                if let Err(e) = &result {
                    warn!(input = %input.display(), error = %e, "File failed");
                }
                FileOutcome {
                    input: input.clone(),
                    result,
                }
            })
            .collect();
        info!(
            operation = operation.name(),
            files = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
            "Processing finished"
        );
        Ok(outcomes)
    }
}
