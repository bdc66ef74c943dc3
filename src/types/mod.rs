//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `book`: Inventory record for a single title
//! - `issue`: Issue records, their status and identifiers
//! - `command`: Lending commands replayed through the ledger
//! - `error`: Error types for the lending engine

pub mod book;
pub mod command;
pub mod error;
pub mod issue;

pub use book::Book;
pub use command::{CommandKind, LendingCommand};
pub use error::LendingError;
pub use issue::{BookId, Issue, IssueFilter, IssueId, IssueStatus, MemberId};
