//! Age thresholds and the request-time freshness decision.

use std::time::Duration;

/// Where an entry's age falls relative to the policy thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Young enough to serve as-is.
    Fresh,
    /// Still servable, but a background refresh should be scheduled.
    Stale,
    /// Too old to serve; the client must wait for a refresh.
    Expired,
}

/// The two boundaries that split an entry's lifetime into
/// fresh, stale, and expired.
///
/// Freshness is never stored. It is recomputed from the entry's age on every
/// request, so an entry written once drifts through all three states with no
/// bookkeeping and no sweeper.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    fresh_for: Duration,
    expire_after: Duration,
}

impl FreshnessPolicy {
    /// Entries younger than this are served without contacting upstream.
    pub const DEFAULT_FRESH_FOR: Duration = Duration::from_secs(60);

    /// Entries at least this old are no longer served.
    pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(3_600);

    /// Builds a policy with custom boundaries.
    ///
    /// `fresh_for` must not exceed `expire_after`; equal values remove the
    /// stale window entirely, which is a legitimate (if unusual) policy.
    pub fn new(fresh_for: Duration, expire_after: Duration) -> Self {
        debug_assert!(fresh_for <= expire_after);
        Self {
            fresh_for,
            expire_after,
        }
    }

    /// Classifies an entry age. Both boundaries are half-open: an entry is
    /// fresh strictly below `fresh_for` and expired at exactly `expire_after`.
    pub fn classify(&self, age: Duration) -> Freshness {
        if age < self.fresh_for {
            Freshness::Fresh
        } else if age < self.expire_after {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRESH_FOR, Self::DEFAULT_EXPIRE_AFTER)
    }
}
