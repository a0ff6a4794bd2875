//! Query lifecycle state.

use std::fmt;

use super::model::SunPosition;
use crate::error::QueryError;

/// Lifecycle of the astronomical query.
///
/// ```text
/// Idle ──► InFlight ──► Completed(position)
///             │    └──► Failed(error)
///             └───────► Idle            (consumer cancelled)
/// Completed / Failed ──► InFlight       (next query)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryState {
    /// No query has run since start, or the last one was cancelled.
    #[default]
    Idle,
    /// A query is running; further requests are no-ops.
    InFlight,
    /// The last query succeeded.
    Completed(SunPosition),
    /// The last query failed.
    Failed(QueryError),
}

impl QueryState {
    /// Whether a query is currently running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, QueryState::InFlight)
    }

    /// Position carried by a completed state.
    pub fn position(&self) -> Option<SunPosition> {
        match self {
            QueryState::Completed(position) => Some(*position),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Idle => "Idle",
            QueryState::InFlight => "InFlight",
            QueryState::Completed(_) => "Completed",
            QueryState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryState::Completed(p) => write!(
                f,
                "Completed (azimuth {:.1}°, altitude {:.1}°)",
                p.azimuth, p.altitude
            ),
            QueryState::Failed(e) => write!(f, "Failed ({})", e),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// How a single query run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Position computed and published.
    Completed(SunPosition),
    /// Location or ephemeris failed; published as `QueryState::Failed`.
    Failed(QueryError),
    /// The consumer went away; the result was discarded.
    Cancelled,
    /// Another query was already in flight; nothing was started.
    AlreadyInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(QueryState::default(), QueryState::Idle);
        assert!(!QueryState::default().is_in_flight());
    }

    #[test]
    fn test_position_only_when_completed() {
        let p = SunPosition::new(200.0, 12.0);
        assert_eq!(QueryState::Completed(p).position(), Some(p));
        assert_eq!(QueryState::InFlight.position(), None);
        assert_eq!(
            QueryState::Failed(QueryError::Ephemeris("x".into())).position(),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryState::InFlight.to_string(), "InFlight");
        let failed = QueryState::Failed(QueryError::LocationTimeout {
            timeout: std::time::Duration::from_secs(5),
        });
        assert!(failed.to_string().contains("timed out"));
    }
}
