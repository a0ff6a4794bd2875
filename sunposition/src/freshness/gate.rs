//! Staleness decision.

use std::time::Duration;

use crate::time::{duration_millis, Timestamp};

/// Default staleness threshold: 10 minutes.
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_millis(600_000);

/// Decides whether a new astronomical query is due.
///
/// The boundary is exclusive: a result exactly `threshold` old is still fresh.
/// A `last_success` in the future (clock moved backwards) counts as fresh too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessGate {
    threshold_ms: i64,
}

impl Default for FreshnessGate {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_THRESHOLD)
    }
}

impl FreshnessGate {
    /// Create a gate with the given staleness threshold.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold_ms: duration_millis(threshold),
        }
    }

    /// Staleness threshold.
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms.max(0) as u64)
    }

    /// `true` if there is no prior success or it is older than the threshold.
    pub fn should_query(&self, now: Timestamp, last_success: Option<Timestamp>) -> bool {
        match last_success {
            None => true,
            Some(last) => now.millis_since(last) > self.threshold_ms,
        }
    }

    /// Time left until the last success goes stale, `None` if already due.
    ///
    /// Never more than the threshold, even for a `last_success` in the future.
    pub fn remaining(&self, now: Timestamp, last_success: Option<Timestamp>) -> Option<Duration> {
        let last = last_success?;
        let left = self
            .threshold_ms
            .saturating_sub(now.millis_since(last))
            .min(self.threshold_ms);
        (left >= 0).then(|| Duration::from_millis(left as u64))
    }
}
