//! Value types exchanged with the location and ephemeris sources.

use std::fmt;

use crate::error::QueryError;

/// Geographic coordinate in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn validate(self) -> Result<Self, QueryError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(self)
        } else {
            Err(QueryError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Sun direction as returned by the ephemeris.
///
/// The azimuth is passed through as-is; only composite angles are wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Degrees clockwise from north.
    pub azimuth: f64,
    /// Degrees above the horizon; negative below.
    pub altitude: f64,
}

impl SunPosition {
    /// Create a sun position.
    pub const fn new(azimuth: f64, altitude: f64) -> Self {
        Self { azimuth, altitude }
    }

    /// Whether the sun is above the horizon. Exactly 0.0 is not.
    pub fn is_visible(&self) -> bool {
        self.altitude > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_is_strict() {
        assert!(!SunPosition::new(180.0, -0.01).is_visible());
        assert!(!SunPosition::new(180.0, 0.0).is_visible());
        assert!(SunPosition::new(180.0, 0.01).is_visible());
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(53.55, 9.99).validate().is_ok());
        assert!(Coordinate::new(-90.0, 180.0).validate().is_ok());
        assert!(matches!(
            Coordinate::new(91.0, 0.0).validate(),
            Err(QueryError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, f64::NAN).validate().is_err());
    }
}
