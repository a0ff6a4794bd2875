//! Rotation matrix from gravity and geomagnetic vectors.
//!
//! With `A` the gravity vector and `E` the magnetic field (both in device
//! coordinates), `H = E × A` points east and `M = A × H` points magnetic north.
//! The rows `[H; M; A]` form the device-to-world rotation.

use super::RawVector3;

/// Below this horizontal-field magnitude the east vector is unreliable.
///
/// Small values mean the device is in free fall, sits close to a magnetic pole,
/// or the two vectors are (nearly) parallel.
pub const MIN_HORIZONTAL_FIELD_NORM: f64 = 0.1;

/// Row-major 3×3 rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(pub [f64; 9]);

/// Euler angles in radians extracted from a [`RotationMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Rotation about the world Z axis; 0 is magnetic north.
    pub azimuth: f64,
    /// Rotation about the device X axis.
    pub pitch: f64,
    /// Rotation about the device Y axis.
    pub roll: f64,
}

impl RotationMatrix {
    /// Derive the rotation from filtered gravity and geomagnetic vectors.
    ///
    /// Returns `None` when the inputs are degenerate (zero, non-finite or
    /// parallel vectors).
    pub fn from_gravity_and_field(
        gravity: &RawVector3,
        geomagnetic: &RawVector3,
    ) -> Option<Self> {
        if !gravity.is_finite() || !geomagnetic.is_finite() {
            return None;
        }

        let h = geomagnetic.cross(gravity);
        let norm_h = h.norm();
        if norm_h < MIN_HORIZONTAL_FIELD_NORM {
            return None;
        }

        let norm_a = gravity.norm();
        if norm_a == 0.0 {
            return None;
        }

        let h = h.scale(1.0 / norm_h);
        let a = gravity.scale(1.0 / norm_a);
        let m = a.cross(&h);

        Some(Self([h.x, h.y, h.z, m.x, m.y, m.z, a.x, a.y, a.z]))
    }

    /// Extract azimuth, pitch and roll.
    pub fn orientation(&self) -> Orientation {
        let r = &self.0;
        Orientation {
            azimuth: r[1].atan2(r[4]),
            pitch: (-r[7]).clamp(-1.0, 1.0).asin(),
            roll: (-r[6]).atan2(r[8]),
        }
    }

    /// Azimuth only, in radians in [-π, π].
    pub fn azimuth(&self) -> f64 {
        self.0[1].atan2(self.0[4])
    }
}
