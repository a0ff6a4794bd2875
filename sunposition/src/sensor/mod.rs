//! Sensor delivery and the fusion task.
//!
//! The platform pushes [`SensorEvent`]s into a [`SensorSink`]; a single task
//! per active [`SensorSubscription`] drains them through the orientation
//! filter and publishes compass and sun animation frames.

mod fusion;
mod source;
mod subscription;

pub use fusion::{FusionOutputs, FusionState, FusionStep};
pub use source::{ManualSensorSource, SensorEvent, SensorSink, SensorSource};
pub use subscription::SensorSubscription;
