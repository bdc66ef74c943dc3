//! Batch processing with book-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! lending commands concurrently while keeping every book's commands in file
//! order.
//!
//! # Design
//!
//! A batch is split into one sub-batch per book. Each sub-batch runs as its
//! own tokio task and applies its commands one after another through the
//! shared ledger. Commands for different books run in parallel; they still
//! meet inside the ledger wherever they share a member's borrow allowance.
//!
//! ```text
//! BatchProcessor
//!     └── Arc<IssueLedger>  (shared, thread-safe)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::ledger::IssueLedger;
use crate::types::{BookId, LendingCommand, LendingError};

/// Outcome of applying one command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was applied
    pub command: LendingCommand,

    /// What the ledger made of it
    pub result: Result<(), LendingError>,
}

/// Batch processor with book-based partitioning
///
/// Cheap to clone; clones share the same ledger.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    ledger: Arc<IssueLedger>,
}

impl BatchProcessor {
    /// Create a processor over a shared ledger
    pub fn new(ledger: Arc<IssueLedger>) -> Self {
        Self { ledger }
    }

    /// Split a batch into per-book sub-batches
    ///
    /// Every command lands in exactly one sub-batch, and each sub-batch keeps
    /// the original relative order.
    pub fn partition_by_book(
        &self,
        batch: Vec<LendingCommand>,
    ) -> HashMap<BookId, Vec<LendingCommand>> {
        let mut book_batches: HashMap<BookId, Vec<LendingCommand>> = HashMap::new();

        for command in batch {
            book_batches.entry(command.book()).or_default().push(command);
        }

        book_batches
    }

    /// Apply one book's commands in order
    ///
    /// A rejected command is recorded in its result and does not stop the
    /// ones after it.
    pub async fn process_book_commands(
        &self,
        commands: Vec<LendingCommand>,
    ) -> Vec<ProcessingResult> {
        commands
            .into_iter()
            .map(|command| {
                let result = self.ledger.apply(command.clone());
                ProcessingResult { command, result }
            })
            .collect()
    }

    /// Apply a batch with one task per book
    ///
    /// Waits for every task before returning. Results are grouped by book, so
    /// their overall order differs from the input.
    pub async fn process_batch(&self, batch: Vec<LendingCommand>) -> Vec<ProcessingResult> {
        let tasks: Vec<_> = self
            .partition_by_book(batch)
            .into_values()
            .map(|commands| {
                let processor = self.clone();
                tokio::spawn(async move { processor.process_book_commands(commands).await })
            })
            .collect();

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(book_results) => results.extend(book_results),
                Err(error) => tracing::error!(%error, "book task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifier::LogNotifier;
    use crate::core::policy::LendingPolicy;
    use chrono::{TimeZone, Utc};

    fn processor() -> (BatchProcessor, Arc<IssueLedger>) {
        let ledger = Arc::new(IssueLedger::with_notifier(
            Arc::new(LogNotifier),
            LendingPolicy::default(),
        ));
        (BatchProcessor::new(Arc::clone(&ledger)), ledger)
    }

    fn issue(member: u32, book: BookId, day: u32) -> LendingCommand {
        LendingCommand::Issue {
            member,
            book,
            issue_date: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            estimated_return_date: Utc.with_ymd_and_hms(2024, 3, day + 7, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_partition_by_book_empty_batch() {
        let (processor, _) = processor();

        assert!(processor.partition_by_book(vec![]).is_empty());
    }

    #[test]
    fn test_partition_by_book_keeps_order() {
        let (processor, _) = processor();
        let batch = vec![
            LendingCommand::Stock { book: 1, copies: 1 },
            LendingCommand::Stock { book: 2, copies: 1 },
            LendingCommand::Join { member: 5, book: 1 },
            LendingCommand::Leave { member: 5, book: 1 },
            LendingCommand::Join { member: 6, book: 3 },
        ];

        let partitioned = processor.partition_by_book(batch);

        assert_eq!(partitioned.len(), 3);
        assert_eq!(
            partitioned[&1],
            vec![
                LendingCommand::Stock { book: 1, copies: 1 },
                LendingCommand::Join { member: 5, book: 1 },
                LendingCommand::Leave { member: 5, book: 1 },
            ]
        );
        assert_eq!(partitioned[&2].len(), 1);
        assert_eq!(partitioned[&3].len(), 1);
    }

    #[tokio::test]
    async fn test_process_book_commands_continues_after_rejection() {
        let (processor, ledger) = processor();
        let commands = vec![
            LendingCommand::Stock { book: 1, copies: 1 },
            issue(10, 1, 1),
            issue(20, 1, 2),
            LendingCommand::Join { member: 20, book: 1 },
        ];

        let results = processor.process_book_commands(commands).await;

        assert_eq!(results.len(), 4);
        assert!(results[0].result.is_ok());
        assert!(results[1].result.is_ok());
        assert_eq!(results[2].result, Err(LendingError::book_unavailable(1)));
        assert!(results[3].result.is_ok());
        assert_eq!(ledger.waitlist(1), vec![20]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_handles_many_books() {
        let (processor, ledger) = processor();
        let mut batch = Vec::new();
        for book in 1..=20 {
            batch.push(LendingCommand::Stock { book, copies: 2 });
            batch.push(issue(book, book, 1));
            batch.push(issue(book + 100, book, 1));
            batch.push(issue(book + 200, book, 1));
        }

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 80);
        assert_eq!(results.iter().filter(|r| r.result.is_err()).count(), 20);
        for book in ledger.books() {
            assert_eq!(book.available_copies, 0);
            assert_eq!(book.borrow_count, 2);
        }
    }
}
