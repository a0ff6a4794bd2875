//! Loading and sun-visibility flags for the presentation layer.

use std::fmt;

use tokio::sync::watch;

use crate::query::{QueryState, SunPosition};

/// Text shown while a query runs.
pub const STATUS_LOADING: &str = "Loading sun position...";
/// Text shown when the last query failed and nothing is known.
pub const STATUS_FAILED: &str = "Unable to determine the sun position";
/// Text shown when the sun is below the horizon.
pub const STATUS_BELOW_HORIZON: &str = "The sun is below the horizon";
/// Text shown before the first query.
pub const STATUS_WAITING: &str = "Waiting for location";

/// Derived view flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    /// A query is running.
    pub is_loading: bool,
    /// The last successful query put the sun above the horizon.
    pub is_sun_visible: bool,
    /// The last query failed.
    pub last_failed: bool,
    /// At least one query has succeeded.
    pub has_position: bool,
}

impl VisibilityState {
    /// Whether the status description should be shown instead of the sun.
    pub fn description_visible(&self) -> bool {
        self.is_loading || !self.is_sun_visible
    }

    /// Human-readable status line.
    pub fn status_text(&self) -> &'static str {
        if self.is_loading {
            STATUS_LOADING
        } else if self.is_sun_visible {
            ""
        } else if self.has_position {
            STATUS_BELOW_HORIZON
        } else if self.last_failed {
            STATUS_FAILED
        } else {
            STATUS_WAITING
        }
    }
}

impl fmt::Display for VisibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_text() {
            "" => write!(f, "sun visible"),
            text => f.write_str(text),
        }
    }
}

/// Maps query lifecycle and last known position to [`VisibilityState`].
pub struct VisibilityClassifier;

impl VisibilityClassifier {
    /// Classify from the current state and the last successful position.
    ///
    /// `last_position` is the most recent success even when `state` is a
    /// later failure, so a failure never hides a known sun.
    pub fn classify(state: &QueryState, last_position: Option<SunPosition>) -> VisibilityState {
        let position = state.position().or(last_position);
        VisibilityState {
            is_loading: state.is_in_flight(),
            is_sun_visible: position.is_some_and(|p| p.is_visible()),
            last_failed: matches!(state, QueryState::Failed(_)),
            has_position: position.is_some(),
        }
    }
}

/// Live classifier over the published query channels.
#[derive(Debug, Clone)]
pub struct VisibilityWatcher {
    state: watch::Receiver<QueryState>,
    position: watch::Receiver<Option<SunPosition>>,
}

impl VisibilityWatcher {
    /// Watch the given state and position channels.
    pub fn new(
        state: watch::Receiver<QueryState>,
        position: watch::Receiver<Option<SunPosition>>,
    ) -> Self {
        Self { state, position }
    }

    /// Classify the current snapshot.
    pub fn current(&self) -> VisibilityState {
        let position = *self.position.borrow();
        VisibilityClassifier::classify(&self.state.borrow(), position)
    }

    /// Wait for the next query state change and classify it.
    ///
    /// Returns `None` once the query service is gone.
    pub async fn changed(&mut self) -> Option<VisibilityState> {
        self.state.changed().await.ok()?;
        Some(self.current())
    }
}
