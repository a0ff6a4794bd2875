//! Low-pass filtering and heading extraction.
//!
//! Each sensor kind has its own single-pole IIR filter per axis:
//!
//! ```text
//! filtered[i] += alpha * (raw[i] - filtered[i])
//! ```
//!
//! Raw magnetometer readings in particular jitter by several degrees of
//! heading between samples; with `alpha = 0.05` the filter settles in roughly
//! 60 samples (about a second at game sensor rate).

use tracing::trace;

use super::heading::{CompassDegree, Heading, HeadingNormalizer};
use super::rotation::{Orientation, RotationMatrix};
use super::{RawVector3, SensorKind};

/// Default smoothing factor for both sensors.
pub const DEFAULT_LOW_PASS_ALPHA: f64 = 0.05;

/// Running filter state for one tracking session.
///
/// Owned by [`OrientationFilter`] and only ever mutated through `&mut`, so
/// concurrent accelerometer and magnetometer callbacks must be serialized
/// before they reach it.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    accelerometer: RawVector3,
    magnetometer: RawVector3,
    accelerometer_set: bool,
    magnetometer_set: bool,
}

impl FilterState {
    /// Whether both sensors have contributed at least one sample.
    pub fn is_ready(&self) -> bool {
        self.accelerometer_set && self.magnetometer_set
    }

    /// Filtered gravity vector.
    pub fn accelerometer(&self) -> RawVector3 {
        self.accelerometer
    }

    /// Filtered geomagnetic vector.
    pub fn magnetometer(&self) -> RawVector3 {
        self.magnetometer
    }

    pub fn has_accelerometer(&self) -> bool {
        self.accelerometer_set
    }

    pub fn has_magnetometer(&self) -> bool {
        self.magnetometer_set
    }
}

/// Turns raw sensor samples into compass degrees.
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    alpha: f64,
    state: FilterState,
    last_heading: Option<Heading>,
    last_orientation: Option<Orientation>,
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationFilter {
    /// Create a filter with the default smoothing factor.
    pub fn new() -> Self {
        Self::with_alpha(DEFAULT_LOW_PASS_ALPHA)
    }

    /// Create a filter with a custom smoothing factor in (0, 1].
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            state: FilterState::default(),
            last_heading: None,
            last_orientation: None,
        }
    }

    /// Feed one raw sample.
    ///
    /// Returns the new compass degree, or `None` while only one sensor kind
    /// has reported or when the filtered vectors are degenerate. A degenerate
    /// sample still updates the filter; only the heading is left unchanged.
    pub fn update(&mut self, kind: SensorKind, sample: RawVector3) -> Option<CompassDegree> {
        if !sample.is_finite() {
            trace!(%kind, "Dropping non-finite sensor sample");
            return None;
        }

        match kind {
            SensorKind::Accelerometer => {
                low_pass(&sample, &mut self.state.accelerometer, self.alpha);
                self.state.accelerometer_set = true;
            }
            SensorKind::Magnetometer => {
                low_pass(&sample, &mut self.state.magnetometer, self.alpha);
                self.state.magnetometer_set = true;
            }
        }

        if !self.state.is_ready() {
            return None;
        }

        let Some(rotation) = RotationMatrix::from_gravity_and_field(
            &self.state.accelerometer,
            &self.state.magnetometer,
        ) else {
            trace!("Degenerate rotation matrix, keeping previous heading");
            return None;
        };

        let orientation = rotation.orientation();
        let heading = Heading::from_radians(orientation.azimuth);
        self.last_heading = Some(heading);
        self.last_orientation = Some(orientation);

        Some(HeadingNormalizer::normalize(heading))
    }

    /// Last successfully extracted heading.
    pub fn last_heading(&self) -> Option<Heading> {
        self.last_heading
    }

    /// Last full orientation (azimuth, pitch, roll), for diagnostics.
    pub fn last_orientation(&self) -> Option<Orientation> {
        self.last_orientation
    }

    /// Current filter state.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Smoothing factor in use.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

fn low_pass(input: &RawVector3, output: &mut RawVector3, alpha: f64) {
    output.x += alpha * (input.x - output.x);
    output.y += alpha * (input.y - output.y);
    output.z += alpha * (input.z - output.z);
}
