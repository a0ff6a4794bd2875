//! Heading normalization.
//!
//! Two related values come out of a heading:
//!
//! - the **dial rotation**, `-degree`, in (-360, 0]. The compass dial turns
//!   opposite to the device, so this is what the compass animation carries.
//!   It is signed and deliberately left unwrapped.
//! - the **compass degree**, the dial rotation wrapped into [0, 360). This is
//!   what the compositor adds to the sun azimuth.

use std::fmt;

/// Raw heading in radians, as extracted from the rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Heading {
    radians: f64,
}

impl Heading {
    /// Wrap a raw azimuth in radians.
    pub const fn from_radians(radians: f64) -> Self {
        Self { radians }
    }

    /// Raw azimuth in radians.
    pub const fn radians(&self) -> f64 {
        self.radians
    }

    /// Raw azimuth in degrees, unwrapped.
    pub fn degrees(&self) -> f64 {
        self.radians.to_degrees()
    }
}

/// Wrap any angle in degrees into [0, 360).
///
/// `rem_euclid` can round tiny negative inputs up to exactly 360.0, which is
/// folded back to 0.0. Non-finite input has no meaningful angle and maps to 0.0.
pub fn wrap_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Device heading expressed for the compass dial, always in [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct CompassDegree {
    /// Heading in degrees, wrapped, before the sign flip.
    heading: f64,
}

impl CompassDegree {
    /// Build from a heading already expressed in degrees.
    pub fn from_heading_degrees(degrees: f64) -> Self {
        Self {
            heading: wrap_degrees(degrees),
        }
    }

    /// Wrapped compass value in [0, 360): `wrap(-heading)`.
    pub fn value(&self) -> f64 {
        wrap_degrees(-self.heading)
    }

    /// Signed dial rotation in (-360, 0]; not wrapped.
    pub fn dial_rotation(&self) -> f64 {
        -self.heading
    }

    /// The heading in [0, 360) before the sign flip (0 = magnetic north).
    pub fn heading(&self) -> f64 {
        self.heading
    }
}

impl fmt::Display for CompassDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.value())
    }
}

/// Converts raw headings into compass degrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingNormalizer;

impl HeadingNormalizer {
    /// `degree = (to_degrees(heading) + 360) mod 360`, then flip and wrap again.
    pub fn normalize(heading: Heading) -> CompassDegree {
        CompassDegree::from_heading_degrees(heading.degrees() + 360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_wrap_degrees_basic() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-10.0), 350.0);
        assert_eq!(wrap_degrees(-720.0), 0.0);
    }

    #[test]
    fn test_wrap_degrees_rounding_edge() {
        let tiny = -1e-20;
        let wrapped = wrap_degrees(tiny);
        assert!((0.0..360.0).contains(&wrapped), "got {}", wrapped);
    }

    #[test]
    fn test_wrap_degrees_non_finite() {
        assert_eq!(wrap_degrees(f64::NAN), 0.0);
        assert_eq!(wrap_degrees(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_normalize_north() {
        let c = HeadingNormalizer::normalize(Heading::from_radians(0.0));
        assert_eq!(c.heading(), 0.0);
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.dial_rotation(), 0.0);
    }

    #[test]
    fn test_normalize_east() {
        let c = HeadingNormalizer::normalize(Heading::from_radians(FRAC_PI_2));
        assert!((c.heading() - 90.0).abs() < 1e-9);
        assert!((c.dial_rotation() + 90.0).abs() < 1e-9);
        assert!((c.value() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_west_from_negative_azimuth() {
        let c = HeadingNormalizer::normalize(Heading::from_radians(-FRAC_PI_2));
        assert!((c.heading() - 270.0).abs() < 1e-9);
        assert!((c.dial_rotation() + 270.0).abs() < 1e-9);
        assert!((c.value() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_dial_rotation_range() {
        for rad in [-PI, -1.0, 0.0, 1.0, PI] {
            let c = HeadingNormalizer::normalize(Heading::from_radians(rad));
            let dial = c.dial_rotation();
            assert!(dial <= 0.0 && dial > -360.0, "dial {} for {}", dial, rad);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_wrap_in_range(x in proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL | proptest::num::f64::ZERO) {
                let w = wrap_degrees(x);
                prop_assert!((0.0..360.0).contains(&w), "wrap({}) = {}", x, w);
            }

            #[test]
            fn test_normalize_in_range(rad in -1.0e6..1.0e6_f64) {
                let c = HeadingNormalizer::normalize(Heading::from_radians(rad));
                prop_assert!((0.0..360.0).contains(&c.value()));
                prop_assert!((0.0..360.0).contains(&c.heading()));
            }
        }
    }
}
