//! Synchronous processing strategy
//!
//! Streams commands with `SyncReader` and applies each one to the ledger on
//! the calling thread, in file order. Because the order is total, replays are
//! fully deterministic, including outcomes that depend on a member's borrow
//! limit across several books.

use crate::core::IssueLedger;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ReplayStats};
use std::path::Path;
use std::sync::Arc;

/// Synchronous processing strategy
///
/// ```no_run
/// use library_lending_engine::core::{IssueLedger, LendingPolicy, LogNotifier};
/// use library_lending_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let ledger = Arc::new(IssueLedger::with_notifier(
///     Arc::new(LogNotifier),
///     LendingPolicy::default(),
/// ));
/// let stats = SyncProcessingStrategy
///     .process(Path::new("commands.csv"), Arc::clone(&ledger))
///     .expect("replay failed");
/// println!("{} commands applied", stats.applied);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, ledger: Arc<IssueLedger>) -> Result<ReplayStats, String> {
        let reader = SyncReader::new(input_path)?;
        let mut stats = ReplayStats::default();

        for row in reader {
            match row {
                Ok(command) => {
                    let kind = command.kind();
                    let book = command.book();
                    let result = ledger.apply(command);
                    if let Err(error) = &result {
                        tracing::warn!(?kind, book, %error, "command rejected");
                    }
                    stats.record(&result);
                }
                Err(error) => {
                    stats.malformed += 1;
                    tracing::warn!(%error, "skipping malformed row");
                }
            }
        }

        tracing::info!(
            applied = stats.applied,
            rejected = stats.rejected,
            malformed = stats.malformed,
            "replay finished"
        );
        Ok(stats)
    }
}
