//! Astronomical query execution.
//!
//! [`SunQueryService`] owns the query lifecycle. A run fetches the device
//! location (bounded by a timeout), computes the sun position on a blocking
//! thread, publishes the result and records the freshness timestamp.
//!
//! ```text
//! request ──► try_begin (Idle/Completed/Failed → InFlight, atomic)
//!                │
//!                ├── already InFlight ──► AlreadyInFlight (no-op)
//!                ▼
//!        location (timeout) ──► validate ──► ephemeris (spawn_blocking)
//!                │                                  │
//!   cancelled ◄──┴──────────── select! ─────────────┘
//!      │                          │
//!   InFlight → Idle       Completed / Failed  (+ freshness write on success)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::model::SunPosition;
use super::sources::{Ephemeris, LocationSource};
use super::state::{QueryOutcome, QueryState};
use crate::compositor::LatestSun;
use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::freshness::{FreshnessGate, FreshnessStore};
use crate::time::Timestamp;

/// Parameters of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest {
    /// Decision time; stored as the new last-success time on completion.
    pub issued_at: Timestamp,
    /// Hours added to `issued_at` before computing the sun position.
    pub hour_offset: i64,
}

impl QueryRequest {
    /// Query for the sun position at `issued_at`.
    pub fn new(issued_at: Timestamp) -> Self {
        Self {
            issued_at,
            hour_offset: 0,
        }
    }

    /// Shift the computed time by `hours`.
    pub fn with_hour_offset(mut self, hours: i64) -> Self {
        self.hour_offset = hours;
        self
    }
}

/// Runs astronomical queries and publishes their results.
pub struct SunQueryService {
    location: Arc<dyn LocationSource>,
    ephemeris: Arc<dyn Ephemeris>,
    store: Arc<dyn FreshnessStore>,
    gate: FreshnessGate,
    location_timeout: Duration,
    state_tx: watch::Sender<QueryState>,
    position_tx: watch::Sender<Option<SunPosition>>,
}

impl SunQueryService {
    /// Create a service in the `Idle` state.
    pub fn new(
        location: Arc<dyn LocationSource>,
        ephemeris: Arc<dyn Ephemeris>,
        store: Arc<dyn FreshnessStore>,
        config: &QueryConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(QueryState::Idle);
        let (position_tx, _) = watch::channel(None);
        Self {
            location,
            ephemeris,
            store,
            gate: FreshnessGate::new(config.refresh_interval),
            location_timeout: config.location_timeout,
            state_tx,
            position_tx,
        }
    }

    /// Subscribe to query state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<QueryState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to the last successfully computed position.
    pub fn subscribe_position(&self) -> watch::Receiver<Option<SunPosition>> {
        self.position_tx.subscribe()
    }

    /// Snapshot reader for the last successfully computed position.
    pub fn latest_sun(&self) -> LatestSun {
        LatestSun::new(self.subscribe_position())
    }

    /// Current query state.
    pub fn state(&self) -> QueryState {
        self.state_tx.borrow().clone()
    }

    /// Last successfully computed position.
    pub fn last_position(&self) -> Option<SunPosition> {
        *self.position_tx.borrow()
    }

    /// Whether the stored result is missing or stale at `now`.
    pub fn should_query(&self, now: Timestamp) -> bool {
        self.gate.should_query(now, self.store.load_last_success())
    }

    /// The freshness gate in use.
    pub fn gate(&self) -> &FreshnessGate {
        &self.gate
    }

    /// Start a query on `handle` unless one is already in flight.
    ///
    /// Returns `None` when another query holds the in-flight slot.
    pub fn spawn(
        self: &Arc<Self>,
        handle: &Handle,
        request: QueryRequest,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<QueryOutcome>> {
        if !self.try_begin() {
            tracing::debug!("Sun query already in flight, ignoring request");
            return None;
        }

        let service = Arc::clone(self);
        Some(handle.spawn(async move { service.complete(request, cancel).await }))
    }

    /// Run a query on the current task.
    pub async fn run(&self, request: QueryRequest, cancel: CancellationToken) -> QueryOutcome {
        if !self.try_begin() {
            tracing::debug!("Sun query already in flight, ignoring request");
            return QueryOutcome::AlreadyInFlight;
        }
        self.complete(request, cancel).await
    }

    /// Atomically claim the in-flight slot.
    fn try_begin(&self) -> bool {
        self.state_tx.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = QueryState::InFlight;
                true
            }
        })
    }

    async fn complete(&self, request: QueryRequest, cancel: CancellationToken) -> QueryOutcome {
        tracing::debug!(
            issued_at = %request.issued_at,
            hour_offset = request.hour_offset,
            "Sun query started"
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.execute(request) => Some(result),
        };

        match result {
            None => {
                self.state_tx.send_if_modified(|state| {
                    if state.is_in_flight() {
                        *state = QueryState::Idle;
                        true
                    } else {
                        false
                    }
                });
                tracing::debug!("Sun query cancelled, result discarded");
                QueryOutcome::Cancelled
            }
            Some(Ok(position)) => {
                // Position first, so a state observer always finds it.
                self.position_tx.send_replace(Some(position));
                self.state_tx.send_replace(QueryState::Completed(position));

                if let Err(e) = self.store.save_last_success(request.issued_at) {
                    tracing::warn!(error = %e, "Failed to persist freshness record");
                }

                tracing::info!(
                    azimuth = position.azimuth,
                    altitude = position.altitude,
                    visible = position.is_visible(),
                    "Sun position updated"
                );
                QueryOutcome::Completed(position)
            }
            Some(Err(error)) => {
                tracing::warn!(error = %error, "Sun position query failed");
                self.state_tx.send_replace(QueryState::Failed(error.clone()));
                QueryOutcome::Failed(error)
            }
        }
    }

    async fn execute(&self, request: QueryRequest) -> Result<SunPosition, QueryError> {
        let coordinate = tokio::time::timeout(
            self.location_timeout,
            self.location.fetch_current_location(),
        )
        .await
        .map_err(|_| QueryError::LocationTimeout {
            timeout: self.location_timeout,
        })??
        .validate()?;

        let at = request
            .issued_at
            .offset_hours(request.hour_offset)
            .to_datetime()
            .ok_or_else(|| {
                QueryError::Ephemeris(format!(
                    "time {} offset by {}h is out of range",
                    request.issued_at, request.hour_offset
                ))
            })?;

        tracing::trace!(coordinate = %coordinate, at = %at, "Computing sun position");

        let ephemeris = Arc::clone(&self.ephemeris);
        tokio::task::spawn_blocking(move || ephemeris.compute(at, coordinate))
            .await
            .map_err(|e| QueryError::TaskFailed(e.to_string()))?
    }
}

impl std::fmt::Debug for SunQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunQueryService")
            .field("state", &*self.state_tx.borrow())
            .field("gate", &self.gate)
            .field("location_timeout", &self.location_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::MemoryFreshnessStore;
    use crate::query::model::Coordinate;
    use chrono::{DateTime, Utc};
    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    struct CountingLocation {
        calls: AtomicUsize,
        coordinate: Coordinate,
    }

    impl CountingLocation {
        fn new(coordinate: Coordinate) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                coordinate,
            }
        }
    }

    impl LocationSource for CountingLocation {
        fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let coordinate = self.coordinate;
            Box::pin(async move { Ok(coordinate) })
        }
    }

    struct FailingLocation;

    impl LocationSource for FailingLocation {
        fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>> {
            Box::pin(async { Err(QueryError::LocationUnavailable("no fix".into())) })
        }
    }

    /// Succeeds on the first call only.
    #[derive(Default)]
    struct FlakyLocation {
        calls: AtomicUsize,
    }

    impl LocationSource for FlakyLocation {
        fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if call == 0 {
                    Ok(Coordinate::new(52.5, 13.4))
                } else {
                    Err(QueryError::LocationUnavailable("lost fix".into()))
                }
            })
        }
    }

    struct PendingLocation {
        calls: AtomicUsize,
    }

    impl LocationSource for PendingLocation {
        fn fetch_current_location(&self) -> BoxFuture<'_, Result<Coordinate, QueryError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(futures::future::pending())
        }
    }

    struct RecordingEphemeris {
        position: SunPosition,
        last_at: Mutex<Option<DateTime<Utc>>>,
    }

    impl RecordingEphemeris {
        fn new(position: SunPosition) -> Self {
            Self {
                position,
                last_at: Mutex::new(None),
            }
        }
    }

    impl Ephemeris for RecordingEphemeris {
        fn compute(
            &self,
            at: DateTime<Utc>,
            _coordinate: Coordinate,
        ) -> Result<SunPosition, QueryError> {
            *self.last_at.lock() = Some(at);
            Ok(self.position)
        }
    }

    fn config() -> QueryConfig {
        QueryConfig {
            location_timeout: Duration::from_millis(50),
            ..QueryConfig::default()
        }
    }

    fn service_with(
        location: Arc<dyn LocationSource>,
        store: Arc<MemoryFreshnessStore>,
    ) -> SunQueryService {
        let ephemeris = Arc::new(RecordingEphemeris::new(SunPosition::new(135.0, 25.0)));
        SunQueryService::new(location, ephemeris, store, &config())
    }

    #[tokio::test]
    async fn test_successful_query_publishes_and_persists() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let location = Arc::new(CountingLocation::new(Coordinate::new(48.1, 11.6)));
        let service = service_with(location.clone(), store.clone());
        let latest = service.latest_sun();

        let outcome = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;

        let expected = SunPosition::new(135.0, 25.0);
        assert_eq!(outcome, QueryOutcome::Completed(expected));
        assert_eq!(service.state(), QueryState::Completed(expected));
        assert_eq!(latest.position(), Some(expected));
        assert_eq!(store.load_last_success(), Some(NOW));
        assert_eq!(location.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_location_failure() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let service = service_with(Arc::new(FailingLocation), store.clone());

        let outcome = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            QueryOutcome::Failed(QueryError::LocationUnavailable(_))
        ));
        assert!(matches!(service.state(), QueryState::Failed(_)));
        assert!(service.last_position().is_none());
        assert!(store.load_last_success().is_none());
    }

    #[tokio::test]
    async fn test_location_timeout() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let location = Arc::new(PendingLocation {
            calls: AtomicUsize::new(0),
        });
        let service = service_with(location, store.clone());

        let outcome = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;

        match outcome {
            QueryOutcome::Failed(err @ QueryError::LocationTimeout { .. }) => {
                assert_eq!(
                    err,
                    QueryError::LocationTimeout {
                        timeout: Duration::from_millis(50)
                    }
                );
                assert!(err.to_string().ends_with("50ms"), "got {}", err);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(store.load_last_success().is_none());
    }

    #[tokio::test]
    async fn test_invalid_coordinate_fails() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let location = Arc::new(CountingLocation::new(Coordinate::new(120.0, 0.0)));
        let service = service_with(location, store);

        let outcome = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            QueryOutcome::Failed(QueryError::InvalidCoordinate { .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_position() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let service = service_with(Arc::new(FlakyLocation::default()), store);

        let first = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;
        assert!(matches!(first, QueryOutcome::Completed(_)));

        let second = service
            .run(QueryRequest::new(NOW), CancellationToken::new())
            .await;
        assert!(matches!(second, QueryOutcome::Failed(_)));
        assert!(matches!(service.state(), QueryState::Failed(_)));
        assert_eq!(
            service.latest_sun().position(),
            Some(SunPosition::new(135.0, 25.0))
        );
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_is_noop() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let location = Arc::new(PendingLocation {
            calls: AtomicUsize::new(0),
        });
        let ephemeris = Arc::new(RecordingEphemeris::new(SunPosition::new(0.0, 0.0)));
        let query_config = QueryConfig {
            location_timeout: Duration::from_secs(60),
            ..QueryConfig::default()
        };
        let service = Arc::new(SunQueryService::new(
            location.clone(),
            ephemeris,
            store,
            &query_config,
        ));

        let cancel = CancellationToken::new();
        let first = service.spawn(&Handle::current(), QueryRequest::new(NOW), cancel.clone());
        assert!(first.is_some());
        assert!(service.state().is_in_flight());

        let second = service.spawn(&Handle::current(), QueryRequest::new(NOW), cancel.clone());
        assert!(second.is_none());
        assert_eq!(
            service
                .run(QueryRequest::new(NOW), CancellationToken::new())
                .await,
            QueryOutcome::AlreadyInFlight
        );

        cancel.cancel();
        let outcome = first.unwrap().await.unwrap();
        assert_eq!(outcome, QueryOutcome::Cancelled);
        assert!(location.calls.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn test_cancel_resets_to_idle_without_persisting() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let location = Arc::new(PendingLocation {
            calls: AtomicUsize::new(0),
        });
        let service = Arc::new(SunQueryService::new(
            location,
            Arc::new(RecordingEphemeris::new(SunPosition::new(0.0, 0.0))),
            store.clone(),
            &QueryConfig::default(),
        ));

        let cancel = CancellationToken::new();
        let handle = service
            .spawn(&Handle::current(), QueryRequest::new(NOW), cancel.clone())
            .unwrap();
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), QueryOutcome::Cancelled);
        assert_eq!(service.state(), QueryState::Idle);
        assert!(store.load_last_success().is_none());
    }

    #[tokio::test]
    async fn test_hour_offset_shifts_compute_time() {
        let store = Arc::new(MemoryFreshnessStore::new());
        let ephemeris = Arc::new(RecordingEphemeris::new(SunPosition::new(0.0, 1.0)));
        let service = SunQueryService::new(
            Arc::new(CountingLocation::new(Coordinate::new(0.0, 0.0))),
            ephemeris.clone(),
            store.clone(),
            &config(),
        );

        service
            .run(
                QueryRequest::new(NOW).with_hour_offset(3),
                CancellationToken::new(),
            )
            .await;

        let at = (*ephemeris.last_at.lock()).unwrap();
        assert_eq!(
            at.timestamp_millis(),
            NOW.as_millis() + 3 * 3_600_000
        );
        // Freshness records the decision time, not the shifted time.
        assert_eq!(store.load_last_success(), Some(NOW));
    }

    #[tokio::test]
    async fn test_should_query_uses_store() {
        let store = Arc::new(MemoryFreshnessStore::with_last_success(NOW));
        let service = service_with(Arc::new(FailingLocation), store);

        assert!(!service.should_query(Timestamp::from_millis(NOW.as_millis() + 600_000)));
        assert!(service.should_query(Timestamp::from_millis(NOW.as_millis() + 600_001)));
    }
}
