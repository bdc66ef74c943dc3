//! Processing strategies for replaying a command file
//!
//! A strategy reads lending commands from CSV and applies them to a ledger.
//! The synchronous strategy applies them one by one in file order; the
//! asynchronous one applies batches with one task per book.

use crate::cli::StrategyType;
use crate::core::IssueLedger;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counters describing one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Commands the ledger accepted
    pub applied: usize,

    /// Commands the ledger rejected
    pub rejected: usize,

    /// Rows that could not be parsed into a command
    pub malformed: usize,
}

impl ReplayStats {
    /// Count one ledger outcome
    pub(crate) fn record<E>(&mut self, result: &Result<(), E>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// A complete replay pipeline: CSV parsing plus ledger application
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the commands in `input_path` against `ledger`
    ///
    /// Rejected commands and malformed rows are logged and skipped; they do
    /// not make this method fail.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplayStats)` - Once every row has been handled
    /// * `Err(String)` - If the file could not be opened or read, or the
    ///   runtime could not start
    fn process(&self, input_path: &Path, ledger: Arc<IssueLedger>) -> Result<ReplayStats, String>;
}

/// Create a processing strategy of the requested type
///
/// `config` is only used by the asynchronous strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(config.unwrap_or_default())),
    }
}
