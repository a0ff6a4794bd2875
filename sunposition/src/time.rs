//! Millisecond wall-clock timestamps.
//!
//! Freshness decisions and the persisted freshness record both work in
//! milliseconds since the Unix epoch, so that is the canonical representation.
//! Conversion to `chrono` happens only at the ephemeris boundary.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from raw epoch milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Epoch milliseconds.
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Signed milliseconds elapsed since `earlier` (negative if `earlier` is later).
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Shift this timestamp by a number of whole hours.
    pub fn offset_hours(&self, hours: i64) -> Self {
        Self(self.0.saturating_add(hours.saturating_mul(3_600_000)))
    }

    /// Convert to a `chrono` UTC datetime.
    ///
    /// Returns `None` if the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Interpret a persisted raw value.
    ///
    /// Zero and negative values are what an empty or corrupt record looks like,
    /// so they read as "no timestamp".
    pub fn from_persisted(millis: i64) -> Option<Self> {
        (millis > 0).then_some(Self(millis))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Convert a duration to whole milliseconds, saturating at `i64::MAX`.
pub fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
