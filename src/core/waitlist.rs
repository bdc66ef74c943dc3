//! Per-book FIFO waitlists
//!
//! Members queue for a book that has no copy on the shelf. The member who
//! joined first is the first one notified when a copy frees up. Being notified
//! does not reserve the copy: the member still has to issue it like anyone
//! else, and may lose the race to another requester.

use crate::types::{BookId, MemberId};
use dashmap::DashMap;
use std::collections::VecDeque;

/// Concurrent set of FIFO queues, one per book
///
/// Each queue holds a member at most once. Operations on one book's queue are
/// serialized by the map's shard lock; different books proceed in parallel.
#[derive(Debug, Default)]
pub struct WaitlistManager {
    queues: DashMap<BookId, VecDeque<MemberId>>,
}

impl WaitlistManager {
    /// Create a manager with no queues
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }

    /// Append a member to a book's queue
    ///
    /// Idempotent: joining twice keeps the original position.
    ///
    /// # Returns
    ///
    /// `true` if the member was appended, `false` if already queued.
    pub fn join(&self, book: BookId, member: MemberId) -> bool {
        let mut queue = self.queues.entry(book).or_default();
        if queue.contains(&member) {
            return false;
        }
        queue.push_back(member);
        true
    }

    /// Remove a member from a book's queue
    ///
    /// # Returns
    ///
    /// `true` if the member was queued, `false` if the call was a no-op.
    pub fn leave(&self, book: BookId, member: MemberId) -> bool {
        let removed = {
            let Some(mut queue) = self.queues.get_mut(&book) else {
                return false;
            };
            match queue.iter().position(|queued| *queued == member) {
                Some(index) => queue.remove(index).is_some(),
                None => false,
            }
        };
        if removed {
            self.drop_if_empty(book);
        }
        removed
    }

    /// The member who would be notified next, without removing them
    pub fn peek_next(&self, book: BookId) -> Option<MemberId> {
        self.queues
            .get(&book)
            .and_then(|queue| queue.front().copied())
    }

    /// Remove and return the head of a book's queue
    ///
    /// Two callers never receive the same member.
    pub fn pop_next(&self, book: BookId) -> Option<MemberId> {
        let head = self
            .queues
            .get_mut(&book)
            .and_then(|mut queue| queue.pop_front());
        if head.is_some() {
            self.drop_if_empty(book);
        }
        head
    }

    /// Put a popped member back at the head of a book's queue
    ///
    /// If the member rejoined in the meantime they are moved to the front
    /// rather than queued twice.
    pub fn requeue_front(&self, book: BookId, member: MemberId) {
        let mut queue = self.queues.entry(book).or_default();
        if let Some(index) = queue.iter().position(|queued| *queued == member) {
            queue.remove(index);
        }
        queue.push_front(member);
    }

    /// Forget a book's queue once nobody is waiting on it
    fn drop_if_empty(&self, book: BookId) {
        self.queues.remove_if(&book, |_, queue| queue.is_empty());
    }

    /// Snapshot of a book's queue in priority order
    pub fn members(&self, book: BookId) -> Vec<MemberId> {
        self.queues
            .get(&book)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }
}
