//! Boundaries to the location provider and the ephemeris.
//!
//! Both are external collaborators. The location source is asynchronous and
//! dyn-compatible through a boxed future, like the cache traits elsewhere in
//! the stack; the ephemeris is a plain synchronous function that the query
//! service moves onto a blocking thread.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use super::model::{Coordinate, SunPosition};
use crate::error::QueryError;

/// One-shot device location lookup.
///
/// May fail, and may never resolve; the caller applies a timeout.
pub trait LocationSource: Send + Sync + 'static {
    /// Fetch the current location.
    fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>>;
}

/// Sun position calculation.
///
/// Deterministic; the only failure is invalid input.
pub trait Ephemeris: Send + Sync + 'static {
    /// Compute the sun position seen from `coordinate` at `at`.
    fn compute(&self, at: DateTime<Utc>, coordinate: Coordinate) -> Result<SunPosition, QueryError>;
}

/// Location source that always answers with the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coordinate: Coordinate,
}

impl FixedLocation {
    /// Always report `coordinate`.
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

impl LocationSource for FixedLocation {
    fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>> {
        let coordinate = self.coordinate;
        Box::pin(async move { Ok(coordinate) })
    }
}
