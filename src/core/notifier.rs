//! Notification gateway that writes to the log
//!
//! Used by the command-line replay, where there is nobody to email.

use crate::core::traits::NotificationGateway;
use crate::types::{BookId, LendingError, MemberId};

/// Emits one `info` event per notification and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationGateway for LogNotifier {
    fn notify(&self, member: MemberId, book: BookId) -> Result<(), LendingError> {
        tracing::info!(member, book, "book available for waitlisted member");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_always_succeeds() {
        assert_eq!(LogNotifier.notify(1, 2), Ok(()));
    }

    #[test]
    fn test_log_notifier_is_a_gateway_object() {
        let gateway: Box<dyn NotificationGateway> = Box::new(LogNotifier);

        assert!(gateway.notify(3, 4).is_ok());
    }
}
