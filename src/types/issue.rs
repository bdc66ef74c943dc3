//! Issue-related types for the lending engine
//!
//! This module defines identifiers and the `Issue` record: one member
//! borrowing one book, open until the copy comes back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Member identifier
///
/// Resolved by the authorization layer; the engine trusts it as given.
pub type MemberId = u32;

/// Book identifier
pub type BookId = u32;

/// Issue identifier, assigned by the ledger in creation order
pub type IssueId = u64;

/// Lifecycle status of an issue
///
/// The only transition is `Issued -> Returned`; `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// The copy is out with the member
    Issued,

    /// The copy came back and the fine has been settled
    Returned,
}

impl IssueStatus {
    /// Lowercase name used in CSV output and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "issued",
            IssueStatus::Returned => "returned",
        }
    }
}

/// A record of one member borrowing one book
///
/// Issues are append-only history: they are created by a successful issuance,
/// closed exactly once by a successful return and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Ledger-assigned identifier
    pub id: IssueId,

    /// The borrowing member
    pub member: MemberId,

    /// The borrowed book
    pub book: BookId,

    /// When the copy left the library
    pub issue_date: DateTime<Utc>,

    /// When the copy is due back (strictly after `issue_date`)
    pub estimated_return_date: DateTime<Utc>,

    /// When the copy actually came back; `None` while the issue is open
    pub return_date: Option<DateTime<Utc>>,

    /// Current lifecycle status
    pub status: IssueStatus,

    /// Fine computed once at return time; zero while open
    pub delayed_fine: Decimal,
}

impl Issue {
    /// Create a new open issue
    pub fn open(
        id: IssueId,
        member: MemberId,
        book: BookId,
        issue_date: DateTime<Utc>,
        estimated_return_date: DateTime<Utc>,
    ) -> Self {
        Issue {
            id,
            member,
            book,
            issue_date,
            estimated_return_date,
            return_date: None,
            status: IssueStatus::Issued,
            delayed_fine: Decimal::ZERO,
        }
    }

    /// Whether the copy is still out
    pub fn is_open(&self) -> bool {
        self.status == IssueStatus::Issued
    }

    /// Close the issue with its return date and settled fine
    pub(crate) fn close(&mut self, return_date: DateTime<Utc>, delayed_fine: Decimal) {
        self.return_date = Some(return_date);
        self.delayed_fine = delayed_fine;
        self.status = IssueStatus::Returned;
    }
}

/// Read-only selection of issues
///
/// Unset fields match everything, so `IssueFilter::default()` lists the
/// whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueFilter {
    /// Only issues of this member
    pub member: Option<MemberId>,

    /// Only issues of this book
    pub book: Option<BookId>,

    /// Only issues in this status
    pub status: Option<IssueStatus>,
}

impl IssueFilter {
    /// Restrict to one member's issues
    pub fn for_member(mut self, member: MemberId) -> Self {
        self.member = Some(member);
        self
    }

    /// Restrict to one book's issues
    pub fn for_book(mut self, book: BookId) -> Self {
        self.book = Some(book);
        self
    }

    /// Restrict to one status
    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `issue` passes every set criterion
    pub fn matches(&self, issue: &Issue) -> bool {
        self.member.map_or(true, |member| issue.member == member)
            && self.book.map_or(true, |book| issue.book == book)
            && self.status.map_or(true, |status| issue.status == status)
    }
}
