//! Orientation fusion: raw accelerometer/magnetometer vectors to compass degrees.
//!
//! # Pipeline
//!
//! ```text
//! RawVector3 ──► low-pass (per sensor kind) ──► rotation matrix ──► azimuth
//!                                                                     │
//!                                      HeadingNormalizer ◄────────────┘
//!                                            │
//!                                            ▼
//!                                      CompassDegree
//! ```
//!
//! Gravity and the geomagnetic field together fix a device-to-world rotation;
//! the first Euler angle of that rotation is the heading. Nothing is produced
//! until both sensors have delivered at least one sample.

mod filter;
mod heading;
mod rotation;

pub use filter::{FilterState, OrientationFilter, DEFAULT_LOW_PASS_ALPHA};
pub use heading::{wrap_degrees, CompassDegree, Heading, HeadingNormalizer};
pub use rotation::{Orientation, RotationMatrix, MIN_HORIZONTAL_FIELD_NORM};

use std::fmt;

/// Which physical sensor produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Linear acceleration including gravity (m/s²).
    Accelerometer,
    /// Ambient magnetic field (µT).
    Magnetometer,
}

impl SensorKind {
    /// Short name for logs and sensor log files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accel",
            SensorKind::Magnetometer => "mag",
        }
    }

    /// Parse the short name used in sensor log files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "accel" | "accelerometer" | "a" => Some(SensorKind::Accelerometer),
            "mag" | "magnetometer" | "m" => Some(SensorKind::Magnetometer),
            _ => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A three-axis vector in device coordinates.
///
/// Used both for single raw readings and for the running filtered state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawVector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawVector3 {
    /// Zero vector.
    pub const ZERO: RawVector3 = RawVector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Cross product `self × other`.
    pub fn cross(&self, other: &RawVector3) -> RawVector3 {
        RawVector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Multiply every component by `factor`.
    pub fn scale(&self, factor: f64) -> RawVector3 {
        RawVector3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for RawVector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}
