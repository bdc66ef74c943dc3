//! Book inventory types for the lending engine
//!
//! A `Book` is the inventory record of one title: how many physical copies
//! exist, how many are on the shelf right now and how often the title has
//! been borrowed.

use super::issue::BookId;
use serde::Serialize;

/// Inventory state of a single title
///
/// `available_copies` always stays within `0..=total_copies`. The `version`
/// stamp moves on every change of the copy counts and is what conditional
/// writes are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// The book identifier
    pub id: BookId,

    /// Number of physical copies owned by the library
    ///
    /// Only changes through an explicit restock.
    pub total_copies: u32,

    /// Copies currently on the shelf
    ///
    /// Equals `total_copies` minus the number of open issues for this book.
    pub available_copies: u32,

    /// Number of times this title has been issued (never decreases)
    pub borrow_count: u64,

    /// Version stamp of the copy counts
    pub version: u64,
}

impl Book {
    /// Create a new book with every copy available
    ///
    /// # Arguments
    ///
    /// * `id` - The book identifier
    /// * `total_copies` - Number of physical copies
    pub fn new(id: BookId, total_copies: u32) -> Self {
        Book {
            id,
            total_copies,
            available_copies: total_copies,
            borrow_count: 0,
            version: 0,
        }
    }

    /// Number of copies currently out on loan
    pub fn issued_copies(&self) -> u32 {
        self.total_copies - self.available_copies
    }

    /// Whether at least one copy can be issued
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_has_all_copies_available() {
        let book = Book::new(7, 3);

        assert_eq!(book.id, 7);
        assert_eq!(book.total_copies, 3);
        assert_eq!(book.available_copies, 3);
        assert_eq!(book.borrow_count, 0);
        assert_eq!(book.version, 0);
        assert_eq!(book.issued_copies(), 0);
        assert!(book.is_available());
    }

    #[test]
    fn test_book_without_copies_is_unavailable() {
        let book = Book::new(1, 0);

        assert!(!book.is_available());
        assert_eq!(book.issued_copies(), 0);
    }
}
