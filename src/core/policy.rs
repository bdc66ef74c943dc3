//! Lending policy configuration
//!
//! Collects the knobs the ledger enforces: how many books a member may hold,
//! how late returns are fined and how often a contended write is retried.

use crate::core::fine::FinePolicy;

/// Policy enforced by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Maximum number of open issues per member
    pub borrow_limit: u32,

    /// How late returns are charged
    pub fine_policy: FinePolicy,

    /// Extra attempts after a version conflict before giving up
    pub max_retries: u32,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            borrow_limit: 3,
            fine_policy: FinePolicy::default(),
            max_retries: 8,
        }
    }
}

impl LendingPolicy {
    /// Create a policy with custom values
    ///
    /// A zero borrow limit would make every issue fail, so it falls back to
    /// the default with a warning. Zero retries is valid and means a single
    /// attempt.
    pub fn new(borrow_limit: u32, fine_policy: FinePolicy, max_retries: u32) -> Self {
        let default = Self::default();

        let borrow_limit = if borrow_limit == 0 {
            tracing::warn!(
                borrow_limit,
                default = default.borrow_limit,
                "invalid borrow limit, using default"
            );
            default.borrow_limit
        } else {
            borrow_limit
        };

        Self {
            borrow_limit,
            fine_policy,
            max_retries,
        }
    }

    /// Total attempts an operation gets, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
