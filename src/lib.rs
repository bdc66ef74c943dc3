//! Library Lending Engine
//! # Overview
//!
//! This library keeps book issuance, returns, inventory counts and waitlists
//! consistent under concurrent access. It can be embedded directly through
//! [`IssueLedger`], or driven from a CSV of lending commands with a sync or
//! async replay strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Book, Issue, LendingCommand, LendingError)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Issue and return transactions with compensation
//!   - [`core::inventory_store`] - Version-stamped copy counts
//!   - [`core::waitlist`] - Per-book FIFO waitlists
//!   - [`core::fine`] - Late-return fines
//! - [`io`] - CSV reading and writing
//! - [`strategy`] - Replay pipelines
//!
//! # Guarantees
//!
//! - A book's available copies never drop below zero or exceed its total
//! - A member holds at most one open issue per book, and at most the
//!   configured number of open issues overall
//! - An issue is closed at most once and its fine never changes afterwards
//! - A failed operation leaves no partial state behind
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use library_lending_engine::{IssueLedger, LendingPolicy, LogNotifier};
//! use std::sync::Arc;
//!
//! let ledger = IssueLedger::with_notifier(Arc::new(LogNotifier), LendingPolicy::default());
//! ledger.register_book(1, 2).unwrap();
//!
//! let issued = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
//! let due = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
//! ledger.issue_book(42, 1, issued, due).unwrap();
//!
//! assert_eq!(ledger.book(1).unwrap().available_copies, 1);
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    CirculationOverview, FineCalculator, FinePolicy, InventoryStore, IssueLedger, LendingPolicy,
    LogNotifier, NotificationGateway, WaitlistManager,
};
pub use io::{write_books_csv, write_issues_csv};
pub use types::{
    Book, BookId, CommandKind, Issue, IssueFilter, IssueId, IssueStatus, LendingCommand,
    LendingError, MemberId,
};
