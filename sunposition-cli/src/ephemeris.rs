//! Ephemeris stand-in for replays.

use chrono::{DateTime, Utc};
use sunposition::error::QueryError;
use sunposition::query::{Coordinate, Ephemeris, SunPosition};

/// Reports the same sun position for any time and place.
#[derive(Debug, Clone, Copy)]
pub struct FixedEphemeris {
    position: SunPosition,
}

impl FixedEphemeris {
    pub fn new(position: SunPosition) -> Self {
        Self { position }
    }
}

impl Ephemeris for FixedEphemeris {
    fn compute(&self, at: DateTime<Utc>, coordinate: Coordinate) -> Result<SunPosition, QueryError> {
        let altitude = self.position.altitude;
        if !altitude.is_finite() || !(-90.0..=90.0).contains(&altitude) {
            return Err(QueryError::Ephemeris(format!(
                "altitude {} outside [-90, 90]",
                altitude
            )));
        }
        tracing::debug!(%at, %coordinate, "Using fixed sun position");
        Ok(self.position)
    }
}
