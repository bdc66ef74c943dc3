//! Error types for the lending engine
//!
//! This module defines all error types that can occur while lending and
//! returning books.
//!
//! # Error Categories
//!
//! - **Validation Errors**: duplicate issue, unavailable book, borrow limit,
//!   missing issue, bad due date. Terminal for the request, never retried.
//! - **Inventory Errors**: unknown or already registered books.
//! - **Concurrency Errors**: version conflicts (retried internally) and
//!   exhausted retry budgets.
//! - **Integrity Errors**: a mutation that would break `0 <= available <= total`.
//! - **Side-effect Errors**: notification failures, logged and never surfaced
//!   to the caller of a return.

use crate::types::{BookId, MemberId};
use thiserror::Error;

/// Main error type for the lending engine
///
/// Each variant carries the identifiers needed to tell the causes apart
/// without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    /// The member already holds an open issue for this book
    #[error("Book {book} is already issued to member {member}")]
    DuplicateIssue {
        /// Member holding the open issue
        member: MemberId,
        /// Book of the open issue
        book: BookId,
    },

    /// The book does not exist or has no copy on the shelf
    #[error("Book {book} is not available")]
    BookUnavailable {
        /// The requested book
        book: BookId,
    },

    /// The member already holds the maximum number of open issues
    #[error("Member {member} has already borrowed {limit} books")]
    BorrowLimitExceeded {
        /// The member over the cap
        member: MemberId,
        /// The configured cap
        limit: u32,
    },

    /// No open issue exists for this member and book
    #[error("No open issue of book {book} for member {member}")]
    IssueNotFound {
        /// The member named in the return
        member: MemberId,
        /// The book named in the return
        book: BookId,
    },

    /// The estimated return date is not after the issue date
    #[error("Estimated return date must be after the issue date (member {member}, book {book})")]
    InvalidDueDate {
        /// The borrowing member
        member: MemberId,
        /// The requested book
        book: BookId,
    },

    /// The book is not registered in the inventory
    #[error("Book {book} not found")]
    BookNotFound {
        /// The unknown book
        book: BookId,
    },

    /// The book is already registered in the inventory
    #[error("Book {book} is already registered")]
    DuplicateBook {
        /// The registered book
        book: BookId,
    },

    /// A mutation would leave available copies outside `0..=total`
    ///
    /// Signals a corrupted availability count. The mutation is not applied.
    #[error("Invariant violation on book {book}: {available} available of {total}, delta {delta}")]
    InvariantViolation {
        /// The book whose counts were touched
        book: BookId,
        /// Available copies before the rejected mutation
        available: u32,
        /// Total copies before the rejected mutation
        total: u32,
        /// The rejected change
        delta: i64,
    },

    /// The book changed between read and conditional write
    ///
    /// Transient: the ledger retries the whole operation.
    #[error("Version conflict on book {book}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The contended book
        book: BookId,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The retry budget ran out before the operation could commit
    #[error("{operation} on book {book} failed after {attempts} attempts")]
    TransactionFailed {
        /// Operation that gave up
        operation: String,
        /// The contended book
        book: BookId,
        /// Number of attempts made
        attempts: u32,
    },

    /// The notification gateway could not deliver a message
    #[error("Failed to notify member {member} about book {book}: {message}")]
    NotificationFailure {
        /// The member to notify
        member: MemberId,
        /// The book that became available
        book: BookId,
        /// Gateway-specific detail
        message: String,
    },
}

impl LendingError {
    /// Create a DuplicateIssue error
    pub fn duplicate_issue(member: MemberId, book: BookId) -> Self {
        LendingError::DuplicateIssue { member, book }
    }

    /// Create a BookUnavailable error
    pub fn book_unavailable(book: BookId) -> Self {
        LendingError::BookUnavailable { book }
    }

    /// Create a BorrowLimitExceeded error
    pub fn borrow_limit_exceeded(member: MemberId, limit: u32) -> Self {
        LendingError::BorrowLimitExceeded { member, limit }
    }

    /// Create an IssueNotFound error
    pub fn issue_not_found(member: MemberId, book: BookId) -> Self {
        LendingError::IssueNotFound { member, book }
    }

    /// Create an InvalidDueDate error
    pub fn invalid_due_date(member: MemberId, book: BookId) -> Self {
        LendingError::InvalidDueDate { member, book }
    }

    /// Create a BookNotFound error
    pub fn book_not_found(book: BookId) -> Self {
        LendingError::BookNotFound { book }
    }

    /// Create a DuplicateBook error
    pub fn duplicate_book(book: BookId) -> Self {
        LendingError::DuplicateBook { book }
    }

    /// Create an InvariantViolation error
    pub fn invariant_violation(book: BookId, available: u32, total: u32, delta: i64) -> Self {
        LendingError::InvariantViolation {
            book,
            available,
            total,
            delta,
        }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(book: BookId, expected: u64, actual: u64) -> Self {
        LendingError::VersionConflict {
            book,
            expected,
            actual,
        }
    }

    /// Create a TransactionFailed error
    pub fn transaction_failed(operation: &str, book: BookId, attempts: u32) -> Self {
        LendingError::TransactionFailed {
            operation: operation.to_string(),
            book,
            attempts,
        }
    }

    /// Create a NotificationFailure error
    pub fn notification_failure(member: MemberId, book: BookId, message: &str) -> Self {
        LendingError::NotificationFailure {
            member,
            book,
            message: message.to_string(),
        }
    }

    /// Whether the error may go away on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, LendingError::VersionConflict { .. })
    }
}
