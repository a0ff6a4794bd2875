//! Start/stop handle for sensor delivery.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::fusion::{run_fusion, FusionOutputs, FusionState};
use super::source::{SensorSink, SensorSource};

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<FusionState>,
}

/// Owns the fusion task while sensors are active.
///
/// ```text
/// start():  SensorSource.register(sink) ──► mpsc ──► fusion task (owns FusionState)
/// stop():   unregister, cancel sink + task, take FusionState back
/// ```
///
/// The filter state moves into the task on `start` and back out on `stop`,
/// so it is never shared and needs no lock.
pub struct SensorSubscription {
    source: Arc<dyn SensorSource>,
    outputs: FusionOutputs,
    channel_capacity: usize,
    parked: Option<FusionState>,
    running: Option<Running>,
}

impl SensorSubscription {
    /// Create a stopped subscription.
    pub fn new(
        source: Arc<dyn SensorSource>,
        state: FusionState,
        outputs: FusionOutputs,
        channel_capacity: usize,
    ) -> Self {
        Self {
            source,
            outputs,
            channel_capacity: channel_capacity.max(1),
            parked: Some(state),
            running: None,
        }
    }

    /// Register with the sensor source and start the fusion task.
    ///
    /// Returns `false` if already running.
    pub fn start(&mut self, handle: &Handle) -> bool {
        if self.running.is_some() {
            return false;
        }

        let state = self.parked.take().unwrap_or_default();
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let cancel = CancellationToken::new();

        let task = handle.spawn(run_fusion(rx, cancel.clone(), state, self.outputs.clone()));
        self.source.register(SensorSink::new(tx, cancel.clone()));
        self.running = Some(Running { cancel, task });

        tracing::debug!("Sensor subscription started");
        true
    }

    /// Unregister and stop the fusion task.
    ///
    /// No sample is processed after this returns. Returns `false` if it was
    /// not running.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };

        self.source.unregister();
        running.cancel.cancel();

        let state = match running.task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Fusion task ended abnormally, resetting filter");
                FusionState::default()
            }
        };
        self.parked = Some(state);

        tracing::debug!("Sensor subscription stopped");
        true
    }

    /// Whether the fusion task is running.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Running count of consumed sensor events.
    pub fn subscribe_processed(&self) -> watch::Receiver<u64> {
        self.outputs.subscribe_processed()
    }

    /// Fusion state while stopped.
    pub fn parked_state(&self) -> Option<&FusionState> {
        self.parked.as_ref()
    }
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            self.source.unregister();
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationFrame;
    use crate::compositor::LatestSun;
    use crate::orientation::{RawVector3, SensorKind};
    use crate::sensor::ManualSensorSource;
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn subscription(
        source: Arc<ManualSensorSource>,
    ) -> (SensorSubscription, broadcast::Receiver<AnimationFrame>) {
        let (compass, compass_rx) = broadcast::channel(64);
        let (sun, _) = broadcast::channel(64);
        let (_position_tx, position_rx) = watch::channel(None);
        let outputs = FusionOutputs::new(compass, sun, LatestSun::new(position_rx));
        (
            SensorSubscription::new(source, FusionState::with_alpha(1.0), outputs, 64),
            compass_rx,
        )
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let source = Arc::new(ManualSensorSource::new());
        let (mut sub, mut compass_rx) = subscription(source.clone());

        assert!(sub.start(&Handle::current()));
        assert!(!sub.start(&Handle::current()));
        assert!(source.is_registered());

        source.emit(SensorKind::Accelerometer, RawVector3::new(0.0, 0.0, 9.81));
        source.emit(SensorKind::Magnetometer, RawVector3::new(0.0, 22.0, -40.0));

        let frame = tokio::time::timeout(Duration::from_secs(1), compass_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame.previous, 0.0);

        assert!(sub.stop().await);
        assert!(!sub.stop().await);
        assert!(!source.is_registered());
        assert!(sub.parked_state().unwrap().filter().state().is_ready());
    }

    #[tokio::test]
    async fn test_stale_sink_is_noop_after_stop() {
        let source = Arc::new(ManualSensorSource::new());
        let (mut sub, _compass_rx) = subscription(source.clone());

        sub.start(&Handle::current());
        assert!(sub.stop().await);

        // Unregistered; nothing reaches the filter.
        assert!(!source.emit(SensorKind::Accelerometer, RawVector3::new(0.0, 0.0, 9.81)));
        assert!(!sub.parked_state().unwrap().filter().state().has_accelerometer());
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let source = Arc::new(ManualSensorSource::new());
        let (mut sub, mut compass_rx) = subscription(source.clone());

        sub.start(&Handle::current());
        source.emit(SensorKind::Accelerometer, RawVector3::new(0.0, 0.0, 9.81));
        source.emit(SensorKind::Magnetometer, RawVector3::new(0.0, 22.0, -40.0));
        let first = tokio::time::timeout(Duration::from_secs(1), compass_rx.recv())
            .await
            .unwrap()
            .unwrap();
        sub.stop().await;

        sub.start(&Handle::current());
        // Only one kind after restart, yet output resumes: both-set survived.
        source.emit(SensorKind::Magnetometer, RawVector3::new(0.0, 22.0, -40.0));
        let second = tokio::time::timeout(Duration::from_secs(1), compass_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.previous, first.current);
        sub.stop().await;
    }
}
