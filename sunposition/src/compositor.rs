//! Projection of the sun azimuth into the device's screen frame.
//!
//! The compositor is a latest-value join: every compass sample is combined
//! with the most recently published sun azimuth. The sun moves about a
//! quarter of a degree per minute while the compass updates at sensor rate,
//! so only compass samples drive new output.
//!
//! # Radius offset
//!
//! The sun marker sits on a circle around the compass dial. The radius
//! offset nudges it along the radial axis depending on the screen angle:
//!
//! ```text
//! f(d) = 90 - d      d in [0, 90]
//!      = d - 90      d in (90, 180]
//!      = |270 - d|   d in (180, 270]
//!      = d - 270     d in (270, 360)
//!
//! radius_offset = floor(f(d) / 1.5)
//! ```

use tokio::sync::watch;

use crate::orientation::{wrap_degrees, CompassDegree};
use crate::query::SunPosition;

/// Divisor turning the angular distance into a radius offset.
const RADIUS_OFFSET_DIVISOR: f64 = 1.5;

/// Sun position expressed relative to the current device heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeAngle {
    /// Screen angle in [0, 360); 0 means the sun is straight ahead.
    pub angle: f64,
    /// Radial nudge for the sun marker.
    pub radius_offset: i32,
}

/// Combine a compass degree with an absolute sun azimuth.
pub fn compose(compass: CompassDegree, sun_azimuth: f64) -> CompositeAngle {
    let angle = wrap_degrees(sun_azimuth + compass.value());
    CompositeAngle {
        angle,
        radius_offset: radius_offset(angle),
    }
}

/// Radius offset for a screen angle in [0, 360).
pub fn radius_offset(angle: f64) -> i32 {
    let d = wrap_degrees(angle);
    let distance = if d <= 90.0 {
        90.0 - d
    } else if d <= 180.0 {
        d - 90.0
    } else if d <= 270.0 {
        (270.0 - d).abs()
    } else {
        d - 270.0
    };
    (distance / RADIUS_OFFSET_DIVISOR).floor() as i32
}

/// Read side of the published sun position.
///
/// Wraps a `watch` receiver holding the last successfully computed position.
/// Each read takes a snapshot of an immutable `Copy` value, so a concurrent
/// query completion is seen either fully or not at all.
#[derive(Debug, Clone)]
pub struct LatestSun {
    rx: watch::Receiver<Option<SunPosition>>,
}

impl LatestSun {
    /// Wrap a last-known-position receiver.
    pub fn new(rx: watch::Receiver<Option<SunPosition>>) -> Self {
        Self { rx }
    }

    /// Most recent successfully computed sun position, if any.
    ///
    /// A later failed or in-flight query does not hide an earlier result.
    pub fn position(&self) -> Option<SunPosition> {
        *self.rx.borrow()
    }

    /// Compose against the latest sun position, if one is known.
    pub fn compose(&self, compass: CompassDegree) -> Option<CompositeAngle> {
        self.position().map(|sun| compose(compass, sun.azimuth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compass(value: f64) -> CompassDegree {
        // value() is wrap(-heading), so heading = -value.
        CompassDegree::from_heading_degrees(-value)
    }

    #[test]
    fn test_compose_wraps_past_360() {
        let c = compose(compass(350.0), 20.0);
        assert!((c.angle - 10.0).abs() < 1e-9, "angle {}", c.angle);
        assert_eq!(c.radius_offset, 53);
    }

    #[test]
    fn test_compose_negative_azimuth() {
        let c = compose(compass(0.0), -10.0);
        assert!((c.angle - 350.0).abs() < 1e-9, "angle {}", c.angle);
        assert_eq!(c.radius_offset, 53);
    }

    #[test]
    fn test_compose_straight_ahead() {
        // Device faces 135°, sun at azimuth 135°.
        let c = compose(CompassDegree::from_heading_degrees(135.0), 135.0);
        assert!(c.angle.abs() < 1e-9);
    }

    #[test]
    fn test_radius_offset_branches() {
        assert_eq!(radius_offset(0.0), 60);
        assert_eq!(radius_offset(45.0), 30);
        assert_eq!(radius_offset(90.0), 0);
        assert_eq!(radius_offset(135.0), 30);
        assert_eq!(radius_offset(180.0), 60);
        assert_eq!(radius_offset(225.0), 30);
        assert_eq!(radius_offset(270.0), 0);
        assert_eq!(radius_offset(315.0), 30);
        assert_eq!(radius_offset(359.0), 59);
    }

    #[test]
    fn test_latest_sun_snapshot() {
        let sun = SunPosition::new(120.0, 30.0);
        let (tx, rx) = watch::channel(None);
        let latest = LatestSun::new(rx);

        assert!(latest.position().is_none());
        assert!(latest.compose(compass(0.0)).is_none());

        tx.send_replace(Some(sun));
        assert_eq!(latest.position(), Some(sun));

        let c = latest.compose(compass(10.0)).unwrap();
        assert!((c.angle - 130.0).abs() < 1e-9);
        assert_eq!(c.radius_offset, 26);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_compose_in_range(c in 0.0..360.0_f64, azimuth in -1.0e6..1.0e6_f64) {
                let out = compose(compass(c), azimuth);
                prop_assert!((0.0..360.0).contains(&out.angle), "angle {}", out.angle);
                prop_assert!((0..=60).contains(&out.radius_offset));
            }

            #[test]
            fn test_radius_offset_symmetric(d in 0.001..359.999_f64) {
                prop_assert_eq!(radius_offset(d), radius_offset(360.0 - d));
            }
        }
    }
}
