//! The per-session fusion state and the task loop that drives it.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::source::SensorEvent;
use crate::animation::{AnimationFrame, CompassFrameTracker, SunAnimationFrame, SunFrameTracker};
use crate::compositor::LatestSun;
use crate::orientation::{CompassDegree, OrientationFilter};

/// Where the fusion task publishes its frames.
#[derive(Debug, Clone)]
pub struct FusionOutputs {
    compass: broadcast::Sender<AnimationFrame>,
    sun: broadcast::Sender<SunAnimationFrame>,
    latest_sun: LatestSun,
    /// Total events consumed, across subscriptions.
    processed: Arc<watch::Sender<u64>>,
}

impl FusionOutputs {
    pub fn new(
        compass: broadcast::Sender<AnimationFrame>,
        sun: broadcast::Sender<SunAnimationFrame>,
        latest_sun: LatestSun,
    ) -> Self {
        let (processed, _) = watch::channel(0);
        Self {
            compass,
            sun,
            latest_sun,
            processed: Arc::new(processed),
        }
    }

    /// Subscribe to the running count of consumed sensor events.
    pub fn subscribe_processed(&self) -> watch::Receiver<u64> {
        self.processed.subscribe()
    }
}

/// Frames produced by one sensor event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionStep {
    pub compass: CompassDegree,
    pub compass_frame: AnimationFrame,
    /// Absent until a sun position is known.
    pub sun_frame: Option<SunAnimationFrame>,
}

/// State owned by the fusion task.
///
/// Outlives a single subscription, so filtered vectors and frame continuity
/// survive a pause/resume cycle.
#[derive(Debug, Clone, Default)]
pub struct FusionState {
    filter: OrientationFilter,
    compass_frames: CompassFrameTracker,
    sun_frames: SunFrameTracker,
}

impl FusionState {
    /// Fresh state with the given low-pass factor.
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            filter: OrientationFilter::with_alpha(alpha),
            ..Self::default()
        }
    }

    /// The orientation filter.
    pub fn filter(&self) -> &OrientationFilter {
        &self.filter
    }

    /// Last compass frame emitted.
    pub fn last_compass_frame(&self) -> AnimationFrame {
        self.compass_frames.last()
    }

    /// Last sun frame emitted.
    pub fn last_sun_frame(&self) -> SunAnimationFrame {
        self.sun_frames.last()
    }

    /// Fold one event in and publish whatever it produces.
    pub fn process(&mut self, event: SensorEvent, outputs: &FusionOutputs) -> Option<FusionStep> {
        let compass = self.filter.update(event.kind, event.vector)?;

        let compass_frame = self.compass_frames.push(compass.dial_rotation());
        // No receivers is fine; frames are not replayed.
        let _ = outputs.compass.send(compass_frame);

        let sun_frame = outputs.latest_sun.compose(compass).map(|composite| {
            let frame = self.sun_frames.push(composite);
            let _ = outputs.sun.send(frame);
            frame
        });

        tracing::trace!(
            compass = compass.value(),
            sun_angle = sun_frame.map(|f| f.current_angle),
            "Fusion step"
        );

        Some(FusionStep {
            compass,
            compass_frame,
            sun_frame,
        })
    }
}

/// Drain sensor events into `state` until cancelled or the channel closes.
///
/// Returns the state so the next subscription can continue from it.
pub(crate) async fn run_fusion(
    mut rx: mpsc::Receiver<SensorEvent>,
    cancel: CancellationToken,
    mut state: FusionState,
    outputs: FusionOutputs,
) -> FusionState {
    tracing::debug!("Fusion task started");
    let mut processed: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => {
                    state.process(event, &outputs);
                    outputs.processed.send_modify(|n| *n += 1);
                    processed += 1;
                }
                None => break,
            },
        }
    }

    tracing::debug!(processed, "Fusion task stopped");
    state
}
