//! Lending commands for the lending engine
//!
//! A `LendingCommand` is one request replayed through the ledger: stocking a
//! title, issuing or returning a copy, or joining/leaving a waitlist.

use super::issue::{BookId, MemberId};
use chrono::{DateTime, Utc};

/// Command kinds accepted by the engine
///
/// Used by the CSV layer to name the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Register a title or add copies to it
    Stock,

    /// Lend a copy to a member
    Issue,

    /// Take a copy back from a member
    Return,

    /// Queue a member for a title
    Join,

    /// Remove a member from a title's queue
    Leave,
}

/// A single request to the lending engine
#[derive(Debug, Clone, PartialEq)]
pub enum LendingCommand {
    /// Register `book` with `copies`, or add `copies` if it already exists
    Stock { book: BookId, copies: u32 },

    /// Issue a copy of `book` to `member`
    Issue {
        member: MemberId,
        book: BookId,
        issue_date: DateTime<Utc>,
        estimated_return_date: DateTime<Utc>,
    },

    /// Return `member`'s copy of `book`
    Return {
        member: MemberId,
        book: BookId,
        return_date: DateTime<Utc>,
    },

    /// Put `member` on the waitlist of `book`
    Join { member: MemberId, book: BookId },

    /// Take `member` off the waitlist of `book`
    Leave { member: MemberId, book: BookId },
}

impl LendingCommand {
    /// The book this command touches
    ///
    /// Every command targets exactly one book, which is what the async
    /// strategy partitions on.
    pub fn book(&self) -> BookId {
        match self {
            LendingCommand::Stock { book, .. }
            | LendingCommand::Issue { book, .. }
            | LendingCommand::Return { book, .. }
            | LendingCommand::Join { book, .. }
            | LendingCommand::Leave { book, .. } => *book,
        }
    }

    /// The kind of this command
    pub fn kind(&self) -> CommandKind {
        match self {
            LendingCommand::Stock { .. } => CommandKind::Stock,
            LendingCommand::Issue { .. } => CommandKind::Issue,
            LendingCommand::Return { .. } => CommandKind::Return,
            LendingCommand::Join { .. } => CommandKind::Join,
            LendingCommand::Leave { .. } => CommandKind::Leave,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[rstest]
    #[case::stock(LendingCommand::Stock { book: 4, copies: 2 }, 4, CommandKind::Stock)]
    #[case::issue(
        LendingCommand::Issue { member: 1, book: 5, issue_date: at(1), estimated_return_date: at(10) },
        5,
        CommandKind::Issue
    )]
    #[case::return_book(
        LendingCommand::Return { member: 1, book: 6, return_date: at(3) },
        6,
        CommandKind::Return
    )]
    #[case::join(LendingCommand::Join { member: 2, book: 7 }, 7, CommandKind::Join)]
    #[case::leave(LendingCommand::Leave { member: 2, book: 8 }, 8, CommandKind::Leave)]
    fn test_book_and_kind(
        #[case] command: LendingCommand,
        #[case] book: BookId,
        #[case] kind: CommandKind,
    ) {
        assert_eq!(command.book(), book);
        assert_eq!(command.kind(), kind);
    }
}
