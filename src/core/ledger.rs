//! Issue ledger: the transactional core of the lending engine
//!
//! This module provides the `IssueLedger`, which creates and closes issue
//! records and keeps them consistent with the inventory and the waitlists.
//!
//! # Architecture
//!
//! ```text
//! IssueLedger
//!     ├── Arc<InventoryStore>          (copy counts, version-stamped)
//!     ├── Arc<WaitlistManager>         (per-book FIFO queues)
//!     ├── Arc<dyn NotificationGateway> (best-effort delivery)
//!     ├── FineCalculator               (pure fine policy)
//!     └── issue history + open-issue index + per-member open counts
//! ```
//!
//! # Concurrency
//!
//! Issuing uses optimistic concurrency. Each attempt validates against a book
//! snapshot, reserves the (member, book) slot and one unit of the member's
//! borrow allowance, then applies a conditional decrement against the
//! snapshot's version. If the decrement loses a race the reservations are
//! released and the whole attempt runs again from a fresh snapshot, up to
//! the policy's retry budget. Nothing is visible as an issue until the
//! decrement has committed.
//!
//! Returning first marks the pair's open entry as closing, so two concurrent
//! returns cannot both close it and an issuance for the same pair is refused
//! as a duplicate until the return is done. The entry is only removed after
//! the issue record is closed and the allowance released. If the increment
//! cannot commit, the entry goes back to open.
//!
//! Waitlist notifications run after the commit with no map guard held. The
//! head is popped before delivery so two notifications never reach the same
//! member; a failed delivery puts them back at the front and never undoes
//! the return.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::fine::FineCalculator;
use crate::core::inventory_store::InventoryStore;
use crate::core::policy::LendingPolicy;
use crate::core::traits::NotificationGateway;
use crate::core::waitlist::WaitlistManager;
use crate::types::{
    Book, BookId, Issue, IssueFilter, IssueId, LendingCommand, LendingError, MemberId,
};

/// Aggregate circulation numbers across the whole inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CirculationOverview {
    /// Number of registered titles
    pub titles: usize,

    /// Physical copies owned across all titles
    pub total_copies: u64,

    /// Copies currently out on loan
    pub issued_copies: u64,

    /// Issuances ever made across all titles
    pub total_borrows: u64,
}

impl CirculationOverview {
    /// Issuances that have been returned
    pub fn returned_copies(&self) -> u64 {
        self.total_borrows.saturating_sub(self.issued_copies)
    }
}

/// State of a (member, book) pair in the open-issue index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenSlot {
    /// An issuance holds the slot but has not committed yet
    Pending,
    /// The issue is open
    Open(IssueId),
    /// A return is closing the issue
    Closing(IssueId),
}

impl OpenSlot {
    fn issue_id(self) -> Option<IssueId> {
        match self {
            OpenSlot::Pending => None,
            OpenSlot::Open(id) | OpenSlot::Closing(id) => Some(id),
        }
    }
}

/// Transactional issue ledger
///
/// Cheap to share behind an `Arc`; every method takes `&self` and is safe to
/// call from many threads at once.
pub struct IssueLedger {
    inventory: Arc<InventoryStore>,
    waitlist: Arc<WaitlistManager>,
    notifier: Arc<dyn NotificationGateway>,
    fines: FineCalculator,
    policy: LendingPolicy,

    /// Every issue ever created, by identifier
    issues: DashMap<IssueId, Issue>,

    /// Open issue per (member, book), including in-flight issuances and returns
    open_issues: DashMap<(MemberId, BookId), OpenSlot>,

    /// Open issues (committed or in flight) per member
    open_counts: DashMap<MemberId, u32>,

    next_issue_id: AtomicU64,
}

impl IssueLedger {
    /// Create a ledger over the given stores
    ///
    /// # Arguments
    ///
    /// * `inventory` - Shared book inventory
    /// * `waitlist` - Shared waitlist queues
    /// * `notifier` - Gateway used to tell waitlisted members a copy is back
    /// * `policy` - Borrow limit, fine policy and retry budget
    pub fn new(
        inventory: Arc<InventoryStore>,
        waitlist: Arc<WaitlistManager>,
        notifier: Arc<dyn NotificationGateway>,
        policy: LendingPolicy,
    ) -> Self {
        Self {
            inventory,
            waitlist,
            notifier,
            fines: FineCalculator::new(policy.fine_policy),
            policy,
            issues: DashMap::new(),
            open_issues: DashMap::new(),
            open_counts: DashMap::new(),
            next_issue_id: AtomicU64::new(1),
        }
    }

    /// Create a ledger with fresh, empty stores
    pub fn with_notifier(notifier: Arc<dyn NotificationGateway>, policy: LendingPolicy) -> Self {
        Self::new(
            Arc::new(InventoryStore::new()),
            Arc::new(WaitlistManager::new()),
            notifier,
            policy,
        )
    }

    /// The policy this ledger enforces
    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// Issue a copy of `book` to `member`
    ///
    /// Checks, in order: no open issue for the pair, a copy on the shelf, and
    /// the member under the borrow limit. On success the copy count drops by
    /// one, the borrow counter grows by one and the member leaves the book's
    /// waitlist if queued.
    ///
    /// # Returns
    ///
    /// * `Ok(Issue)` - The new open issue
    /// * `Err(LendingError::InvalidDueDate)` - If the due date is not after the issue date
    /// * `Err(LendingError::DuplicateIssue)` - If the member already holds this book
    /// * `Err(LendingError::BookUnavailable)` - If the book is unknown or out of copies
    /// * `Err(LendingError::BorrowLimitExceeded)` - If the member is at the cap
    /// * `Err(LendingError::TransactionFailed)` - If contention outlasted the retry budget
    pub fn issue_book(
        &self,
        member: MemberId,
        book: BookId,
        issue_date: DateTime<Utc>,
        estimated_return_date: DateTime<Utc>,
    ) -> Result<Issue, LendingError> {
        if estimated_return_date <= issue_date {
            return Err(LendingError::invalid_due_date(member, book));
        }

        let issue = self.with_retries("issue", book, || {
            self.try_issue(member, book, issue_date, estimated_return_date)
        })?;

        tracing::debug!(issue = issue.id, member, book, "book issued");
        Ok(issue)
    }

    /// Return `member`'s copy of `book`
    ///
    /// Closes the open issue with the fine for the actual return date and
    /// puts the copy back on the shelf. When that was the only copy on the
    /// shelf, the head of the book's waitlist is notified after the commit.
    ///
    /// # Returns
    ///
    /// * `Ok(Issue)` - The closed issue
    /// * `Err(LendingError::IssueNotFound)` - If there is no open issue for the pair
    /// * `Err(LendingError::TransactionFailed)` - If contention outlasted the retry budget
    pub fn return_book(
        &self,
        member: MemberId,
        book: BookId,
        return_date: DateTime<Utc>,
    ) -> Result<Issue, LendingError> {
        let key = (member, book);

        // Marking the entry closing makes this caller the only one closing it.
        let issue_id = {
            let Some(mut slot) = self.open_issues.get_mut(&key) else {
                return Err(LendingError::issue_not_found(member, book));
            };
            let OpenSlot::Open(id) = *slot else {
                return Err(LendingError::issue_not_found(member, book));
            };
            *slot = OpenSlot::Closing(id);
            id
        };

        let Some(estimated) = self
            .issues
            .get(&issue_id)
            .map(|issue| issue.estimated_return_date)
        else {
            self.reopen(key, issue_id);
            return Err(LendingError::issue_not_found(member, book));
        };

        let shelved = self.with_retries("return", book, || {
            let snapshot = self
                .inventory
                .get_book(book)
                .ok_or_else(|| LendingError::book_not_found(book))?;
            self.inventory.adjust_availability(book, 1, snapshot.version)
        });
        let shelved = match shelved {
            Ok(shelved) => shelved,
            Err(error) => {
                self.reopen(key, issue_id);
                return Err(error);
            }
        };

        let fine = self.fines.compute_fine(estimated, return_date);
        let closed = self.issues.get_mut(&issue_id).map(|mut issue| {
            issue.close(return_date, fine);
            issue.clone()
        });
        self.release_allowance(member);
        self.open_issues
            .remove_if(&key, |_, slot| *slot == OpenSlot::Closing(issue_id));

        let Some(closed) = closed else {
            return Err(LendingError::issue_not_found(member, book));
        };

        tracing::debug!(issue = closed.id, member, book, fine = %closed.delayed_fine, "book returned");

        if shelved.available_copies == 1 {
            self.notify_waitlist_head(book);
        }

        Ok(closed)
    }

    /// Register a new book with all copies on the shelf
    pub fn register_book(&self, book: BookId, total_copies: u32) -> Result<Book, LendingError> {
        let registered = self.inventory.register(book, total_copies)?;
        tracing::debug!(book, total_copies, "book registered");
        Ok(registered)
    }

    /// Add physical copies to a registered book
    ///
    /// When the shelf was empty before, the head of the book's waitlist is
    /// notified after the commit.
    pub fn restock(&self, book: BookId, additional_copies: u32) -> Result<Book, LendingError> {
        let (before, restocked) = self.with_retries("restock", book, || {
            let snapshot = self
                .inventory
                .get_book(book)
                .ok_or_else(|| LendingError::book_not_found(book))?;
            self.inventory
                .restock(book, additional_copies, snapshot.version)
                .map(|restocked| (snapshot.available_copies, restocked))
        })?;

        tracing::debug!(book, additional_copies, total = restocked.total_copies, "book restocked");

        if before == 0 && restocked.available_copies > 0 {
            self.notify_waitlist_head(book);
        }

        Ok(restocked)
    }

    /// Put `member` on the waitlist of a registered book
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the member was appended
    /// * `Ok(false)` - If the member was already queued
    /// * `Err(LendingError::BookNotFound)` - If the book is not registered
    pub fn join_waitlist(&self, member: MemberId, book: BookId) -> Result<bool, LendingError> {
        if self.inventory.get_book(book).is_none() {
            return Err(LendingError::book_not_found(book));
        }
        Ok(self.waitlist.join(book, member))
    }

    /// Take `member` off the waitlist of `book`; a no-op if not queued
    pub fn leave_waitlist(&self, member: MemberId, book: BookId) -> bool {
        self.waitlist.leave(book, member)
    }

    /// Members waiting for `book`, in notification order
    pub fn waitlist(&self, book: BookId) -> Vec<MemberId> {
        self.waitlist.members(book)
    }

    /// Apply one lending command
    ///
    /// `Stock` registers the book, or restocks it if already registered.
    pub fn apply(&self, command: LendingCommand) -> Result<(), LendingError> {
        match command {
            LendingCommand::Stock { book, copies } => match self.register_book(book, copies) {
                Err(LendingError::DuplicateBook { .. }) => self.restock(book, copies).map(drop),
                other => other.map(drop),
            },
            LendingCommand::Issue {
                member,
                book,
                issue_date,
                estimated_return_date,
            } => self
                .issue_book(member, book, issue_date, estimated_return_date)
                .map(drop),
            LendingCommand::Return {
                member,
                book,
                return_date,
            } => self.return_book(member, book, return_date).map(drop),
            LendingCommand::Join { member, book } => self.join_waitlist(member, book).map(drop),
            LendingCommand::Leave { member, book } => {
                self.leave_waitlist(member, book);
                Ok(())
            }
        }
    }

    /// Issues matching `filter`, ordered by identifier
    pub fn list_issues(&self, filter: &IssueFilter) -> Vec<Issue> {
        let mut issues: Vec<Issue> = self
            .issues
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        issues.sort_by_key(|issue| issue.id);
        issues
    }

    /// The open issue for the pair, or else its most recent closed one
    pub fn find_issue(&self, member: MemberId, book: BookId) -> Option<Issue> {
        let open = self
            .open_issues
            .get(&(member, book))
            .and_then(|slot| slot.issue_id());
        if let Some(issue) = open.and_then(|id| self.issues.get(&id).map(|issue| issue.clone())) {
            return Some(issue);
        }

        self.list_issues(&IssueFilter::default().for_member(member).for_book(book))
            .into_iter()
            .max_by_key(|issue| issue.id)
    }

    /// Snapshot of one book
    pub fn book(&self, book: BookId) -> Option<Book> {
        self.inventory.get_book(book)
    }

    /// Snapshot of every book, ordered by identifier
    pub fn books(&self) -> Vec<Book> {
        self.inventory.all_books()
    }

    /// Number of open issues `member` holds
    pub fn open_issue_count(&self, member: MemberId) -> u32 {
        self.open_counts.get(&member).map_or(0, |count| *count)
    }

    /// Aggregate numbers across the inventory
    pub fn overview(&self) -> CirculationOverview {
        self.books()
            .iter()
            .fold(CirculationOverview::default(), |mut overview, book| {
                overview.titles += 1;
                overview.total_copies += u64::from(book.total_copies);
                overview.issued_copies += u64::from(book.issued_copies());
                overview.total_borrows += book.borrow_count;
                overview
            })
    }

    /// One optimistic issuance attempt
    fn try_issue(
        &self,
        member: MemberId,
        book: BookId,
        issue_date: DateTime<Utc>,
        estimated_return_date: DateTime<Utc>,
    ) -> Result<Issue, LendingError> {
        let key = (member, book);

        if self.open_issues.contains_key(&key) {
            return Err(LendingError::duplicate_issue(member, book));
        }
        let snapshot = self
            .inventory
            .get_book(book)
            .filter(Book::is_available)
            .ok_or_else(|| LendingError::book_unavailable(book))?;
        if self.open_issue_count(member) >= self.policy.borrow_limit {
            return Err(LendingError::borrow_limit_exceeded(
                member,
                self.policy.borrow_limit,
            ));
        }

        match self.open_issues.entry(key) {
            Entry::Occupied(_) => return Err(LendingError::duplicate_issue(member, book)),
            Entry::Vacant(slot) => {
                slot.insert(OpenSlot::Pending);
            }
        }

        if let Err(error) = self.reserve_allowance(member) {
            self.open_issues.remove(&key);
            return Err(error);
        }

        if let Err(error) = self.inventory.adjust_availability(book, -1, snapshot.version) {
            self.release_allowance(member);
            self.open_issues.remove(&key);
            return Err(error);
        }
        self.waitlist.leave(book, member);

        if let Err(error) = self.inventory.increment_borrow_count(book) {
            // Registered books are never removed, so this only fires on a bug.
            tracing::error!(%error, book, "borrow count missed a committed issue");
        }

        let id = self.next_issue_id.fetch_add(1, Ordering::Relaxed);
        let issue = Issue::open(id, member, book, issue_date, estimated_return_date);
        self.issues.insert(id, issue.clone());
        self.open_issues.insert(key, OpenSlot::Open(id));

        Ok(issue)
    }

    /// Hand a closing entry back to the open state after a failed return
    fn reopen(&self, key: (MemberId, BookId), issue_id: IssueId) {
        if let Some(mut slot) = self.open_issues.get_mut(&key) {
            if *slot == OpenSlot::Closing(issue_id) {
                *slot = OpenSlot::Open(issue_id);
            }
        }
    }

    /// Take one unit of the member's borrow allowance
    fn reserve_allowance(&self, member: MemberId) -> Result<(), LendingError> {
        let mut count = self.open_counts.entry(member).or_insert(0);
        if *count >= self.policy.borrow_limit {
            return Err(LendingError::borrow_limit_exceeded(
                member,
                self.policy.borrow_limit,
            ));
        }
        *count += 1;
        Ok(())
    }

    /// Give back one unit of the member's borrow allowance
    fn release_allowance(&self, member: MemberId) {
        if let Some(mut count) = self.open_counts.get_mut(&member) {
            *count = count.saturating_sub(1);
        }
    }

    /// Run `attempt` until it stops reporting a transient error
    ///
    /// Gives up with `TransactionFailed` once the retry budget is spent.
    fn with_retries<T>(
        &self,
        operation: &str,
        book: BookId,
        mut attempt: impl FnMut() -> Result<T, LendingError>,
    ) -> Result<T, LendingError> {
        let attempts = self.policy.max_attempts();

        for round in 1..=attempts {
            match attempt() {
                Err(error) if error.is_transient() => {
                    tracing::debug!(%error, operation, round, "retrying after conflict");
                    thread::yield_now();
                }
                Err(error @ LendingError::InvariantViolation { .. }) => {
                    tracing::error!(%error, operation, book, "availability invariant violated");
                    return Err(error);
                }
                other => return other,
            }
        }

        tracing::warn!(operation, book, attempts, "retry budget exhausted");
        Err(LendingError::transaction_failed(operation, book, attempts))
    }

    /// Notify the first waiting member that a copy is back
    ///
    /// The head is taken off the queue before delivery. A failed delivery
    /// puts them back at the front for the next copy.
    fn notify_waitlist_head(&self, book: BookId) {
        let Some(member) = self.waitlist.pop_next(book) else {
            return;
        };

        match self.notifier.notify(member, book) {
            Ok(()) => {
                tracing::debug!(member, book, "waitlisted member notified");
            }
            Err(error) => {
                self.waitlist.requeue_front(book, member);
                tracing::warn!(%error, member, book, "waitlist notification failed");
            }
        }
    }
}

impl fmt::Debug for IssueLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueLedger")
            .field("inventory", &self.inventory)
            .field("waitlist", &self.waitlist)
            .field("policy", &self.policy)
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}
