//! Tracking session lifecycle.
//!
//! [`SunTracker`] is the facade a host application drives: `resume` when the
//! view becomes visible, `pause` when it goes away. It owns the sensor
//! subscription and the query service and hands out the output streams.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::animation::{AnimationFrame, SunAnimationFrame};
use crate::compositor::LatestSun;
use crate::config::{TrackerConfig, MAX_HOUR_OFFSET};
use crate::error::ConfigError;
use crate::freshness::FreshnessStore;
use crate::query::{
    Ephemeris, LocationSource, QueryOutcome, QueryRequest, QueryState, SunQueryService,
};
use crate::sensor::{FusionOutputs, FusionState, SensorSource, SensorSubscription};
use crate::throttle::ThrottleLast;
use crate::time::Timestamp;
use crate::visibility::{VisibilityState, VisibilityWatcher};

/// One sun-tracking session.
///
/// ```text
/// resume(now) ──► sensors.start ──► FreshnessGate ──(stale)──► query.spawn
///                                  └─(no position yet)──────► query.spawn
/// load(now)   ─────────────────────────────────────────────► query.spawn
/// pause()     ──► sensors.stop ──► cancel in-flight query consumer
/// ```
pub struct SunTracker {
    handle: Handle,
    config: TrackerConfig,
    query: Arc<SunQueryService>,
    sensors: SensorSubscription,
    compass_tx: broadcast::Sender<AnimationFrame>,
    sun_tx: broadcast::Sender<SunAnimationFrame>,
    query_cancel: Option<CancellationToken>,
    query_task: Option<JoinHandle<QueryOutcome>>,
}

impl SunTracker {
    /// Create a paused tracker.
    pub fn new(
        handle: Handle,
        config: TrackerConfig,
        location: Arc<dyn LocationSource>,
        ephemeris: Arc<dyn Ephemeris>,
        store: Arc<dyn FreshnessStore>,
        sensor_source: Arc<dyn SensorSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let query = Arc::new(SunQueryService::new(location, ephemeris, store, &config.query));

        let (compass_tx, _) = broadcast::channel(config.output.channel_capacity);
        let (sun_tx, _) = broadcast::channel(config.output.channel_capacity);

        let outputs = FusionOutputs::new(compass_tx.clone(), sun_tx.clone(), query.latest_sun());
        let sensors = SensorSubscription::new(
            sensor_source,
            FusionState::with_alpha(config.compass.low_pass_alpha),
            outputs,
            config.compass.sensor_channel_capacity,
        );

        Ok(Self {
            handle,
            config,
            query,
            sensors,
            compass_tx,
            sun_tx,
            query_cancel: None,
            query_task: None,
        })
    }

    /// Start sensors and query the sun position if the last result is stale.
    ///
    /// A stored record only says an earlier session had a result. Until this
    /// tracker holds a position of its own, every resume queries.
    ///
    /// Returns `true` if a query was started.
    pub fn resume(&mut self, now: Timestamp) -> bool {
        if self.sensors.start(&self.handle) {
            tracing::info!("Sun tracking resumed");
        }

        if self.query.last_position().is_none() {
            tracing::debug!(now = %now, "No sun position in this session yet");
            self.load(now)
        } else if self.query.should_query(now) {
            self.load(now)
        } else {
            tracing::debug!(now = %now, "Sun position is fresh, skipping query");
            false
        }
    }

    /// Query now, ignoring freshness.
    ///
    /// Returns `false` when a query is already in flight.
    pub fn load(&mut self, now: Timestamp) -> bool {
        self.load_with_offset(now, self.config.query.hour_offset)
    }

    /// Query for `now` shifted by `hours`, ignoring freshness.
    ///
    /// The offset is clamped to ±48 hours.
    pub fn load_with_offset(&mut self, now: Timestamp, hours: i64) -> bool {
        let hours = hours.clamp(-MAX_HOUR_OFFSET, MAX_HOUR_OFFSET);
        let cancel = self
            .query_cancel
            .get_or_insert_with(CancellationToken::new)
            .clone();

        let request = QueryRequest::new(now).with_hour_offset(hours);
        match self.query.spawn(&self.handle, request, cancel) {
            Some(task) => {
                self.query_task = Some(task);
                true
            }
            None => false,
        }
    }

    /// Stop sensors and drop interest in any running query.
    ///
    /// An in-flight query is discarded: no state change to `Completed`, no
    /// freshness write.
    pub async fn pause(&mut self) {
        self.sensors.stop().await;

        if let Some(cancel) = self.query_cancel.take() {
            cancel.cancel();
        }
        if let Some(outcome) = self.wait_for_query().await {
            tracing::debug!(?outcome, "Query finished on pause");
        }

        tracing::info!("Sun tracking paused");
    }

    /// Wait for the most recently started query to finish.
    pub async fn wait_for_query(&mut self) -> Option<QueryOutcome> {
        let task = self.query_task.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "Sun query task ended abnormally");
                None
            }
        }
    }

    /// Whether sensors are running.
    pub fn is_running(&self) -> bool {
        self.sensors.is_running()
    }

    /// Compass dial frames.
    pub fn subscribe_compass(&self) -> broadcast::Receiver<AnimationFrame> {
        self.compass_tx.subscribe()
    }

    /// Composite sun frames.
    pub fn subscribe_sun(&self) -> broadcast::Receiver<SunAnimationFrame> {
        self.sun_tx.subscribe()
    }

    /// Compass frames limited to one per throttle interval.
    pub fn throttled_compass(&self) -> ThrottleLast<AnimationFrame> {
        ThrottleLast::new(self.subscribe_compass(), self.config.output.throttle_interval)
    }

    /// Sun frames limited to one per throttle interval.
    pub fn throttled_sun(&self) -> ThrottleLast<SunAnimationFrame> {
        ThrottleLast::new(self.subscribe_sun(), self.config.output.throttle_interval)
    }

    /// Running count of sensor events consumed by the fusion task.
    pub fn subscribe_processed(&self) -> watch::Receiver<u64> {
        self.sensors.subscribe_processed()
    }

    /// Filter and frame state; only available while paused.
    pub fn fusion_state(&self) -> Option<&FusionState> {
        self.sensors.parked_state()
    }

    /// Query lifecycle changes.
    pub fn subscribe_state(&self) -> watch::Receiver<QueryState> {
        self.query.subscribe_state()
    }

    /// Current query state.
    pub fn query_state(&self) -> QueryState {
        self.query.state()
    }

    /// Last known sun position.
    pub fn latest_sun(&self) -> LatestSun {
        self.query.latest_sun()
    }

    /// Current loading/visibility flags.
    pub fn visibility(&self) -> VisibilityState {
        self.visibility_watcher().current()
    }

    /// Live loading/visibility flags.
    pub fn visibility_watcher(&self) -> VisibilityWatcher {
        VisibilityWatcher::new(self.query.subscribe_state(), self.query.subscribe_position())
    }

    /// Active configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

impl Drop for SunTracker {
    fn drop(&mut self) {
        if let Some(cancel) = self.query_cancel.take() {
            cancel.cancel();
        }
    }
}
