//! Overdue fine computation
//!
//! Fines are computed exactly once, when a copy comes back, from the stored
//! due date and the actual return date. Nothing here looks at the clock, so
//! the same inputs always produce the same amount.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

/// How late returns are charged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinePolicy {
    /// Charge this amount for every started day past the due date
    PerDay(Decimal),

    /// Charge this amount once for any late return
    Flat(Decimal),
}

impl Default for FinePolicy {
    fn default() -> Self {
        FinePolicy::PerDay(Decimal::new(1000, 2))
    }
}

/// Pure fine calculator
///
/// Holds only the configured policy. `compute_fine` has no side effects and
/// is idempotent for identical inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FineCalculator {
    policy: FinePolicy,
}

impl FineCalculator {
    /// Create a calculator for the given policy
    pub fn new(policy: FinePolicy) -> Self {
        Self { policy }
    }

    /// The configured policy
    pub fn policy(&self) -> FinePolicy {
        self.policy
    }

    /// Compute the fine for a copy due at `estimated` and returned at `actual`
    ///
    /// Returns zero when the copy came back on or before the due instant.
    /// Under a per-day policy a partially elapsed day counts as a full day.
    ///
    /// # Arguments
    ///
    /// * `estimated` - The due instant stored on the issue
    /// * `actual` - The instant the copy was returned
    ///
    /// # Returns
    ///
    /// The fine amount, never negative.
    pub fn compute_fine(&self, estimated: DateTime<Utc>, actual: DateTime<Utc>) -> Decimal {
        if actual <= estimated {
            return Decimal::ZERO;
        }

        match self.policy {
            FinePolicy::Flat(amount) => amount,
            FinePolicy::PerDay(rate) => rate * Decimal::from(overdue_days(actual - estimated)),
        }
    }
}

/// Number of started days in a positive delay
fn overdue_days(delay: TimeDelta) -> i64 {
    let whole = delay.num_days();
    if delay > TimeDelta::days(whole) {
        whole + 1
    } else {
        whole
    }
}
