//! SunPosition - device-relative sun direction from orientation sensors
//!
//! This library fuses a continuous stream of accelerometer/magnetometer samples
//! with occasional astronomical sun-position queries into animation frames that
//! show where the sun is relative to the direction the device is facing.
//!
//! # Architecture
//!
//! ```text
//! SensorSource ──► OrientationFilter ──► CompassDegree ──┬──► AnimationFrame (compass)
//!                                                         │
//!                                       compose() ◄───────┘
//!                                           ▲
//! FreshnessGate ──► SunQueryService ──► QueryState (watch) ──► VisibilityState
//!                                           │
//!                                           └──► SunAnimationFrame
//! ```
//!
//! The [`session::SunTracker`] wires the pieces together behind a
//! `resume()`/`pause()` lifecycle.

pub mod animation;
pub mod compositor;
pub mod config;
pub mod error;
pub mod freshness;
pub mod logging;
pub mod orientation;
pub mod query;
pub mod sensor;
pub mod session;
pub mod throttle;
pub mod time;
pub mod visibility;

/// Crate version, recorded in persisted state files.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
