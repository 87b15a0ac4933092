//! Asynchronous batch processing strategy
//!
//! Runs a file operation over many inputs in parallel on a tokio multi-threaded
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── inputs split into batches of batch_size files
//!     ├── spawn_blocking per file (file I/O is synchronous)
//!     └── DashMap<index, FileOutcome> collecting results from every worker
//! ```
//!
//! # Isolation
//!
//! Each file gets its own writer, reader and accumulators; the only shared values are
//! the immutable operation settings behind an `Arc`. Batches run one after another so
//! at most `batch_size` files are in flight, on at most `max_concurrent` threads.

use crate::strategy::{FileOperation, FileOutcome, ProcessingStrategy};
use crate::types::X9Error;
use dashmap::DashMap;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for batch processing
///
/// Controls how many files are scheduled together and the number of worker threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of files per batch
    pub batch_size: usize,
    /// Maximum number of files processed concurrently
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                max_concurrent,
                default = default.max_concurrent,
                "Invalid max_concurrent, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// - `batch_size`: Number of files scheduled together (default: 1000)
/// - `max_concurrent`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Run the operation over every input in parallel batches
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the tokio runtime cannot be created. A worker that panics
    /// is reported as a failed file.
    fn process(
        &self,
        inputs: &[PathBuf],
        operation: Arc<dyn FileOperation>,
    ) -> Result<Vec<FileOutcome>, X9Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent.max(1))
            .max_blocking_threads(self.config.max_concurrent.max(1))
            .build()
            .map_err(|e| X9Error::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let outcomes: Arc<DashMap<usize, FileOutcome>> = Arc::new(DashMap::new());

        let batch_size = self.config.batch_size.max(1);

        runtime.block_on(async {
            for (batch_index, batch) in inputs.chunks(batch_size).enumerate() {
                let base = batch_index * batch_size;
                debug!(batch = batch_index, files = batch.len(), "Batch started");

                let tasks = batch.iter().enumerate().map(|(offset, input)| {
                    let operation = Arc::clone(&operation);
                    let outcomes = Arc::clone(&outcomes);
                    let input = input.clone();
                    async move {
                        let path = input.clone();
                        let result = tokio::task::spawn_blocking(move || operation.run(&path))
                            .await
                            .unwrap_or_else(|e| {
                                Err(X9Error::IoError {
                                    message: format!("worker failed: {}", e),
                                })
                            });
                        if let Err(e) = &result {
                            warn!(input = %input.display(), error = %e, "File failed");
                        }
                        outcomes.insert(base + offset, FileOutcome { input, result });
                    }
                });

                // Wait for the whole batch before scheduling the next one
                join_all(tasks).await;
            }
        });

        let mut ordered: Vec<(usize, FileOutcome)> = Arc::try_unwrap(outcomes)
            .map(|map| map.into_iter().collect())
            .unwrap_or_else(|shared| {
                shared
                    .iter()
                    .map(|entry| (*entry.key(), entry.value().clone()))
                    .collect()
            });
        ordered.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<FileOutcome> = ordered.into_iter().map(|(_, outcome)| outcome).collect();

        info!(
            operation = operation.name(),
            files = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
            "Processing finished"
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::sync::SyncProcessingStrategy;
    use crate::strategy::testing::{inputs, CountingOperation};
    use rstest::rstest;
    use std::sync::atomic::Ordering;

    #[rstest]
    #[case::defaults(1000, 4, 1000, 4)]
    #[case::zero_batch(0, 4, 1000, 4)]
    #[case::small(1, 1, 1, 1)]
    fn test_batch_config_new(
        #[case] batch_size: usize,
        #[case] max_concurrent: usize,
        #[case] expected_batch: usize,
        #[case] expected_concurrent: usize,
    ) {
        let config = BatchConfig::new(batch_size, max_concurrent);
        assert_eq!(config.batch_size, expected_batch);
        assert_eq!(config.max_concurrent, expected_concurrent);
    }

    #[test]
    fn test_batch_config_zero_concurrency_uses_cpu_count() {
        let config = BatchConfig::new(10, 0);
        assert_eq!(config.max_concurrent, num_cpus::get());
    }

    #[rstest]
    #[case::one_batch(10)]
    #[case::many_batches(2)]
    #[case::single_file_batches(1)]
    fn test_async_strategy_keeps_input_order(#[case] batch_size: usize) {
        let names = ["a.x9", "bad.x9", "c.x9", "d.x9", "e.x9"];
        let operation = Arc::new(CountingOperation::default());
        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(batch_size, 2));

        let outcomes = strategy.process(&inputs(&names), operation.clone()).unwrap();

        assert_eq!(operation.calls.load(Ordering::SeqCst), names.len());
        let order: Vec<_> = outcomes.iter().map(|o| o.input.clone()).collect();
        assert_eq!(order, inputs(&names));
        assert!(outcomes[1].result.is_err());
    }

    #[test]
    fn test_async_matches_sync() {
        let names = inputs(&["one.x9", "bad.x9", "three.x9"]);
        let sync = SyncProcessingStrategy
            .process(&names, Arc::new(CountingOperation::default()))
            .unwrap();
        let parallel = AsyncProcessingStrategy::new(BatchConfig::default())
            .process(&names, Arc::new(CountingOperation::default()))
            .unwrap();
        assert_eq!(sync, parallel);
    }
}
