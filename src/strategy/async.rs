//! Asynchronous batch processing strategy
//!
//! Reads commands in batches and applies each batch through a
//! `BatchProcessor` on a tokio multi-threaded runtime.
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig     (batch_size, max_concurrent_batches)
//!     ├── AsyncReader     (batch CSV reading)
//!     └── BatchProcessor  (book partitioning + tasks)
//!         └── Arc<IssueLedger>
//! ```
//!
//! # Ordering
//!
//! Batches run one after another, so a book's commands keep their file order
//! even when they span batches. Within a batch, different books run in
//! parallel. Outcomes that only depend on one book's history are therefore
//! the same as with the synchronous strategy; outcomes that depend on a
//! member's borrow limit across books may differ.

use crate::core::{BatchProcessor, IssueLedger};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, ReplayStats};
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                default = default.batch_size,
                "invalid batch size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                default = default.max_concurrent_batches,
                "invalid max concurrent batches 0, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Builds its own runtime per replay, sized by `max_concurrent_batches`.
/// Must not be called from inside another tokio runtime.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a strategy with the given batch configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, ledger: Arc<IssueLedger>) -> Result<ReplayStats, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(ledger);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut stats = ReplayStats::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in processor.process_batch(batch).await {
                    if let Err(error) = &outcome.result {
                        tracing::warn!(
                            kind = ?outcome.command.kind(),
                            book = outcome.command.book(),
                            %error,
                            "command rejected"
                        );
                    }
                    stats.record(&outcome.result);
                }
            }
            stats.malformed = reader.rejected();

            tracing::info!(
                applied = stats.applied,
                rejected = stats.rejected,
                malformed = stats.malformed,
                "replay finished"
            );
            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LendingPolicy, LogNotifier};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "type,member,book,date,due,copies\n{}", rows)
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn ledger() -> Arc<IssueLedger> {
        Arc::new(IssueLedger::with_notifier(
            Arc::new(LogNotifier),
            LendingPolicy::default(),
        ))
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_async_strategy_replays_commands() {
        let file = create_temp_csv(
            "stock,,1,,,1\n\
             stock,,2,,,2\n\
             issue,10,1,2024-03-01,2024-03-08,\n\
             issue,20,2,2024-03-01,2024-03-08,\n\
             issue,30,1,2024-03-02,2024-03-09,\n\
             nonsense,1,1,,,\n",
        );
        let ledger = ledger();

        let stats = AsyncProcessingStrategy::new(BatchConfig::default())
            .process(file.path(), Arc::clone(&ledger))
            .unwrap();

        assert_eq!(
            stats,
            ReplayStats {
                applied: 4,
                rejected: 1,
                malformed: 1
            }
        );
        assert_eq!(ledger.book(1).unwrap().available_copies, 0);
        assert_eq!(ledger.book(2).unwrap().available_copies, 1);
    }

    #[test]
    fn test_async_strategy_keeps_book_order_across_batches() {
        // Every step depends on the one before it for the same book.
        let file = create_temp_csv(
            "stock,,1,,,1\n\
             stock,,2,,,1\n\
             issue,10,1,2024-03-01,2024-03-08,\n\
             join,20,1,,,\n\
             return,10,1,2024-03-10,,\n\
             issue,20,1,2024-03-11,2024-03-18,\n\
             issue,30,2,2024-03-01,2024-03-08,\n",
        );
        let ledger = ledger();

        let stats = AsyncProcessingStrategy::new(BatchConfig::new(2, 4))
            .process(file.path(), Arc::clone(&ledger))
            .unwrap();

        assert_eq!(stats.rejected, 0);
        let open = ledger.find_issue(20, 1).unwrap();
        assert!(open.is_open());
        assert!(ledger.waitlist(1).is_empty());
        assert_eq!(ledger.book(1).unwrap().borrow_count, 2);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let result = AsyncProcessingStrategy::new(BatchConfig::default())
            .process(Path::new("nonexistent.csv"), ledger());

        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
