//! Thread-safe book inventory with version-stamped conditional writes
//!
//! This module provides the `InventoryStore` struct, which owns every book's
//! copy counts and borrow counter.
//!
//! # Design
//!
//! Books live in a `DashMap`, so each conditional write runs while holding the
//! entry's shard lock. That gives the store an atomic compare-and-set primitive
//! per book: a caller reads a snapshot with its `version`, then asks for a
//! change that only applies if the version is still the same. Callers that
//! lose the race get `VersionConflict` and start over from a fresh snapshot.
//!
//! # Invariant
//!
//! `0 <= available_copies <= total_copies` holds for every stored book. Any
//! change that would break it is rejected with `InvariantViolation` and leaves
//! the book untouched.

use crate::types::{Book, BookId, LendingError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent inventory of books
///
/// Operations on different books never block each other; operations on the
/// same book are serialized by DashMap's shard locks.
#[derive(Debug)]
pub struct InventoryStore {
    /// Book state by identifier
    books: DashMap<BookId, Book>,
}

impl InventoryStore {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    /// Register a new book with all copies available
    ///
    /// # Arguments
    ///
    /// * `book_id` - Identifier of the new book
    /// * `total_copies` - Number of physical copies
    ///
    /// # Returns
    ///
    /// * `Ok(Book)` - Snapshot of the registered book
    /// * `Err(LendingError::DuplicateBook)` - If the book already exists
    pub fn register(&self, book_id: BookId, total_copies: u32) -> Result<Book, LendingError> {
        match self.books.entry(book_id) {
            Entry::Occupied(_) => Err(LendingError::duplicate_book(book_id)),
            Entry::Vacant(entry) => {
                let book = Book::new(book_id, total_copies);
                entry.insert(book.clone());
                Ok(book)
            }
        }
    }

    /// Get a snapshot of a book
    ///
    /// The snapshot carries the version to pass to the conditional writes.
    /// Later changes by other threads are not reflected in it.
    pub fn get_book(&self, book_id: BookId) -> Option<Book> {
        self.books.get(&book_id).map(|book| book.clone())
    }

    /// Conditionally change the number of available copies
    ///
    /// Applies `delta` only if the stored version still equals
    /// `expected_version`. On success the version is bumped.
    ///
    /// # Arguments
    ///
    /// * `book_id` - The book to change
    /// * `delta` - Copies to add (positive) or take (negative)
    /// * `expected_version` - Version of the snapshot the caller validated against
    ///
    /// # Returns
    ///
    /// * `Ok(Book)` - Snapshot after the change
    /// * `Err(LendingError::BookNotFound)` - If the book does not exist
    /// * `Err(LendingError::VersionConflict)` - If another writer got there first
    /// * `Err(LendingError::InvariantViolation)` - If the result would leave `0..=total`
    pub fn adjust_availability(
        &self,
        book_id: BookId,
        delta: i64,
        expected_version: u64,
    ) -> Result<Book, LendingError> {
        let mut book = self
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LendingError::book_not_found(book_id))?;

        if book.version != expected_version {
            return Err(LendingError::version_conflict(
                book_id,
                expected_version,
                book.version,
            ));
        }

        let available = i64::from(book.available_copies) + delta;
        if available < 0 || available > i64::from(book.total_copies) {
            return Err(LendingError::invariant_violation(
                book_id,
                book.available_copies,
                book.total_copies,
                delta,
            ));
        }

        book.available_copies = available as u32;
        book.version += 1;
        Ok(book.clone())
    }

    /// Record one more issuance of a book
    ///
    /// The borrow counter is not part of the copy counts, so the version is
    /// left alone.
    pub fn increment_borrow_count(&self, book_id: BookId) -> Result<Book, LendingError> {
        let mut book = self
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LendingError::book_not_found(book_id))?;

        book.borrow_count += 1;
        Ok(book.clone())
    }

    /// Conditionally add physical copies to a book
    ///
    /// Total and available copies grow together, so open issues are unaffected.
    ///
    /// # Returns
    ///
    /// * `Ok(Book)` - Snapshot after the restock
    /// * `Err(LendingError::BookNotFound)` - If the book does not exist
    /// * `Err(LendingError::VersionConflict)` - If another writer got there first
    /// * `Err(LendingError::InvariantViolation)` - If the totals would overflow
    pub fn restock(
        &self,
        book_id: BookId,
        additional_copies: u32,
        expected_version: u64,
    ) -> Result<Book, LendingError> {
        let mut book = self
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LendingError::book_not_found(book_id))?;

        if book.version != expected_version {
            return Err(LendingError::version_conflict(
                book_id,
                expected_version,
                book.version,
            ));
        }

        let (Some(total), Some(available)) = (
            book.total_copies.checked_add(additional_copies),
            book.available_copies.checked_add(additional_copies),
        ) else {
            return Err(LendingError::invariant_violation(
                book_id,
                book.available_copies,
                book.total_copies,
                i64::from(additional_copies),
            ));
        };

        book.total_copies = total;
        book.available_copies = available;
        book.version += 1;
        Ok(book.clone())
    }

    /// Snapshot of every book, ordered by identifier
    pub fn all_books(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self
            .books
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        books.sort_by_key(|book| book.id);
        books
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}
