//! Platform sensor boundary.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::orientation::{RawVector3, SensorKind};
use crate::time::Timestamp;

/// One raw reading from the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub kind: SensorKind,
    pub vector: RawVector3,
    pub timestamp: Timestamp,
}

impl SensorEvent {
    /// Create an event stamped with the current time.
    pub fn now(kind: SensorKind, vector: RawVector3) -> Self {
        Self {
            kind,
            vector,
            timestamp: Timestamp::now(),
        }
    }
}

/// Handle the platform pushes sensor events into.
///
/// Cheap to clone. After the owning subscription stops, every delivery is a
/// silent no-op.
#[derive(Debug, Clone)]
pub struct SensorSink {
    tx: mpsc::Sender<SensorEvent>,
    cancel: CancellationToken,
}

impl SensorSink {
    pub(crate) fn new(tx: mpsc::Sender<SensorEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Deliver without waiting; drops the sample if the queue is full.
    ///
    /// Returns `false` if the sample was not queued.
    pub fn deliver(&self, event: SensorEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!(kind = %event.kind, "Sensor queue full, dropping sample");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Deliver, waiting for queue space.
    pub async fn send(&self, event: SensorEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.tx.send(event) => result.is_ok(),
        }
    }

    /// Whether the subscription behind this sink has stopped.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}

/// Platform sensor subsystem.
///
/// `register` starts delivery of accelerometer and magnetometer events into
/// the sink at driver rate; `unregister` stops it. Events of the two kinds
/// arrive in no particular order relative to each other.
pub trait SensorSource: Send + Sync + 'static {
    /// Begin delivering events into `sink`.
    fn register(&self, sink: SensorSink);

    /// Stop delivering events.
    fn unregister(&self);
}

/// In-process sensor source driven by explicit `emit` calls.
///
/// Used for replaying recorded sensor logs and in tests.
#[derive(Debug, Default)]
pub struct ManualSensorSource {
    sink: Mutex<Option<SensorSink>>,
}

impl ManualSensorSource {
    /// Create an unregistered source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a subscription is currently registered.
    pub fn is_registered(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Emit a reading stamped with the current time.
    ///
    /// Returns `false` when nothing is registered or the sample was dropped.
    pub fn emit(&self, kind: SensorKind, vector: RawVector3) -> bool {
        self.emit_event(SensorEvent::now(kind, vector))
    }

    /// Emit a pre-built event without waiting.
    pub fn emit_event(&self, event: SensorEvent) -> bool {
        match self.current_sink() {
            Some(sink) => sink.deliver(event),
            None => false,
        }
    }

    /// Emit an event, waiting for queue space instead of dropping.
    pub async fn send(&self, event: SensorEvent) -> bool {
        match self.current_sink() {
            Some(sink) => sink.send(event).await,
            None => false,
        }
    }

    fn current_sink(&self) -> Option<SensorSink> {
        self.sink.lock().clone()
    }
}

impl SensorSource for ManualSensorSource {
    fn register(&self, sink: SensorSink) {
        *self.sink.lock() = Some(sink);
    }

    fn unregister(&self) {
        self.sink.lock().take();
    }
}
