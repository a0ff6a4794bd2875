//! Animation frame tracking.
//!
//! A renderer tweens between two discrete updates, so every emitted frame
//! carries both endpoints. The trackers are left folds seeded with a zero
//! frame: each new value becomes `current`, and `previous` is whatever was
//! `current` in the frame before. No smoothing happens here.

use crate::compositor::CompositeAngle;

/// Endpoints for tweening a single angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationFrame {
    pub previous: f64,
    pub current: f64,
}

impl AnimationFrame {
    /// Frame following `self` with a new current value.
    pub fn next(&self, value: f64) -> Self {
        Self {
            previous: self.current,
            current: value,
        }
    }

    /// Linear interpolation between the endpoints, `t` in [0, 1].
    pub fn interpolate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        self.previous + (self.current - self.previous) * t
    }
}

/// Endpoints for tweening the sun marker: angle and radius offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SunAnimationFrame {
    pub previous_angle: f64,
    pub current_angle: f64,
    pub previous_radius_offset: i32,
    pub current_radius_offset: i32,
}

impl SunAnimationFrame {
    /// Frame following `self` with a new composite angle.
    pub fn next(&self, composite: CompositeAngle) -> Self {
        Self {
            previous_angle: self.current_angle,
            current_angle: composite.angle,
            previous_radius_offset: self.current_radius_offset,
            current_radius_offset: composite.radius_offset,
        }
    }

    /// Angle-only view of this frame.
    pub fn angle_frame(&self) -> AnimationFrame {
        AnimationFrame {
            previous: self.previous_angle,
            current: self.current_angle,
        }
    }
}

/// Scan state for a stream of frames.
///
/// Generic over the frame type so the compass and sun streams share the same
/// continuity rule.
#[derive(Debug, Clone, Default)]
pub struct FrameTracker<F> {
    last: F,
    emitted: u64,
}

impl<F: Copy + Default> FrameTracker<F> {
    /// Tracker seeded with the zero frame.
    pub fn new() -> Self {
        Self {
            last: F::default(),
            emitted: 0,
        }
    }

    /// Last emitted frame (the zero frame before any input).
    pub fn last(&self) -> F {
        self.last
    }

    /// Number of frames emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// Tracker for compass dial rotations.
pub type CompassFrameTracker = FrameTracker<AnimationFrame>;

/// Tracker for composite sun angles.
pub type SunFrameTracker = FrameTracker<SunAnimationFrame>;

impl FrameTracker<AnimationFrame> {
    /// Fold one value in and return the emitted frame.
    pub fn push(&mut self, value: f64) -> AnimationFrame {
        self.last = self.last.next(value);
        self.emitted += 1;
        self.last
    }
}

impl FrameTracker<SunAnimationFrame> {
    /// Fold one composite angle in and return the emitted frame.
    pub fn push(&mut self, composite: CompositeAngle) -> SunAnimationFrame {
        self.last = self.last.next(composite);
        self.emitted += 1;
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::radius_offset;

    fn composite(angle: f64) -> CompositeAngle {
        CompositeAngle {
            angle,
            radius_offset: radius_offset(angle),
        }
    }

    #[test]
    fn test_first_frame_previous_is_zero() {
        let mut tracker = CompassFrameTracker::new();
        let frame = tracker.push(-42.0);
        assert_eq!(frame.previous, 0.0);
        assert_eq!(frame.current, -42.0);
    }

    #[test]
    fn test_sun_tracker_seeded_with_zero_frame() {
        let tracker = SunFrameTracker::new();
        assert_eq!(tracker.last(), SunAnimationFrame::default());
        assert_eq!(tracker.emitted(), 0);
    }

    #[test]
    fn test_sun_frames_carry_radius_offsets() {
        let mut tracker = SunFrameTracker::new();

        let first = tracker.push(composite(10.0));
        assert_eq!(first.previous_angle, 0.0);
        assert_eq!(first.previous_radius_offset, 0);
        assert_eq!(first.current_radius_offset, 53);

        let second = tracker.push(composite(90.0));
        assert_eq!(second.previous_angle, 10.0);
        assert_eq!(second.previous_radius_offset, 53);
        assert_eq!(second.current_radius_offset, 0);
        assert_eq!(tracker.emitted(), 2);
    }

    #[test]
    fn test_interpolate() {
        let frame = AnimationFrame {
            previous: 10.0,
            current: 20.0,
        };
        assert_eq!(frame.interpolate(0.0), 10.0);
        assert_eq!(frame.interpolate(0.5), 15.0);
        assert_eq!(frame.interpolate(2.0), 20.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_compass_frames_are_continuous(values in proptest::collection::vec(-720.0..720.0_f64, 1..100)) {
                let mut tracker = CompassFrameTracker::new();
                let frames: Vec<_> = values.iter().map(|v| tracker.push(*v)).collect();

                prop_assert_eq!(frames[0].previous, 0.0);
                for pair in frames.windows(2) {
                    prop_assert_eq!(pair[1].previous, pair[0].current);
                }
                for (frame, value) in frames.iter().zip(values.iter()) {
                    prop_assert_eq!(frame.current, *value);
                }
            }

            #[test]
            fn test_sun_frames_are_continuous(angles in proptest::collection::vec(0.0..360.0_f64, 1..100)) {
                let mut tracker = SunFrameTracker::new();
                let frames: Vec<_> = angles.iter().map(|a| tracker.push(composite(*a))).collect();

                for pair in frames.windows(2) {
                    prop_assert_eq!(pair[1].previous_angle, pair[0].current_angle);
                    prop_assert_eq!(pair[1].previous_radius_offset, pair[0].current_radius_offset);
                }
            }
        }
    }
}
