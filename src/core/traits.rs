//! Core traits at the engine's outer seams
//!
//! The ledger owns its stores directly. Everything it does not own, such as
//! delivering a message to a member, sits behind a trait so callers can plug
//! in their own implementation.

use crate::types::{BookId, LendingError, MemberId};

/// Delivery channel for "your book is available" messages
///
/// The ledger calls `notify` after a return or restock has committed and a
/// copy is back on the shelf. Delivery is best-effort: the ledger logs a
/// failure and never retries or rolls back because of it.
pub trait NotificationGateway: Send + Sync {
    /// Tell `member` that a copy of `book` can now be issued
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the message was handed off
    /// * `Err(LendingError::NotificationFailure)` - If delivery failed
    fn notify(&self, member: MemberId, book: BookId) -> Result<(), LendingError>;
}
