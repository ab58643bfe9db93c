//! Trip lifecycle state machine.
//!
//! A trip is either `Idle` or `Active`; there are no other states.
//! The controller owns the reporter pipeline and serialises
//! transitions through `&mut self`, so callers cannot race a start
//! against an end.

use std::sync::Arc;

use tracing::debug;

use transitline_errors::TrackingResult;
use transitline_source::PositionSource;
use transitline_transport::LocationStore;

use crate::reporter::{Reporter, ReporterConfig};
use crate::snapshot::{ReporterSnapshot, TripState};

/// Owns the reporter pipeline and drives the Idle/Active transitions.
pub struct TripController {
    reporter: Reporter,
}

impl TripController {
    /// Create an idle controller over the given source and store.
    #[must_use]
    pub fn new(
        source: Arc<dyn PositionSource>,
        store: Arc<dyn LocationStore>,
        config: ReporterConfig,
    ) -> Self {
        Self {
            reporter: Reporter::new(source, store, config),
        }
    }

    /// Begin a trip under `identifier`.
    ///
    /// Rejects an empty identifier and stays `Idle`. Acquisition
    /// failure degrades the session rather than blocking the
    /// transition; the trip still becomes `Active`. Starting while
    /// `Active` is a no-op.
    pub async fn start_trip(&mut self, identifier: &str) -> TrackingResult<()> {
        self.reporter.start(identifier).await
    }

    /// End the trip.
    ///
    /// Always reaches `Idle`, even when the retraction fails at the
    /// transport boundary. Ending an idle trip is a no-op.
    pub async fn end_trip(&mut self) {
        if !self.reporter.state().is_active() {
            debug!("end requested while idle; nothing to do");
            return;
        }
        self.reporter.stop().await;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TripState {
        self.reporter.state()
    }

    /// True when the trip is running on the synthetic source.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.reporter.is_degraded()
    }

    /// Clone out a read-only snapshot of the trip session.
    #[must_use]
    pub fn snapshot(&self) -> ReporterSnapshot {
        self.reporter.snapshot()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use transitline_errors::ErrorKind;
    use transitline_geo::Position;
    use transitline_source::Fix;
    use transitline_test_helpers::{RecordingStore, ScriptedSource, must};

    fn controller_with(
        source: Arc<dyn PositionSource>,
        store: Arc<RecordingStore>,
    ) -> TripController {
        TripController::new(source, store, ReporterConfig::default())
    }

    fn working_source() -> Arc<ScriptedSource> {
        Arc::new(
            ScriptedSource::new()
                .with_once_fixes([Fix::new(Position::new(28.6139, 77.2090), 5.0)])
                .with_stream_held_open(Vec::new()),
        )
    }

    #[tokio::test]
    async fn test_empty_identifier_stays_idle() {
        let store = Arc::new(RecordingStore::new());
        let mut controller = controller_with(working_source(), Arc::clone(&store));

        let err = controller.start_trip("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(controller.state(), TripState::Idle);
        assert_eq!(store.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_start_trip_activates_and_publishes_once() {
        let store = Arc::new(RecordingStore::new());
        let mut controller = controller_with(working_source(), Arc::clone(&store));

        must(controller.start_trip("BUS1").await);
        assert_eq!(controller.state(), TripState::Active);
        assert!(!controller.is_degraded());
        assert_eq!(store.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_end_trip_reaches_idle_when_retract_fails() {
        let store = Arc::new(RecordingStore::with_retract_failure());
        let mut controller = controller_with(working_source(), Arc::clone(&store));

        must(controller.start_trip("BUS1").await);
        controller.end_trip().await;

        assert_eq!(controller.state(), TripState::Idle);
        assert!(store.retractions().is_empty(), "retraction was rejected");
        assert!(controller.snapshot().identifier.is_none());
    }

    #[tokio::test]
    async fn test_double_end_trip_is_a_no_op() {
        let store = Arc::new(RecordingStore::new());
        let mut controller = controller_with(working_source(), Arc::clone(&store));

        must(controller.start_trip("BUS1").await);
        controller.end_trip().await;
        controller.end_trip().await;

        assert_eq!(controller.state(), TripState::Idle);
        assert_eq!(store.retractions().len(), 1);
    }

    #[tokio::test]
    async fn test_trip_can_restart_after_ending() {
        let store = Arc::new(RecordingStore::new());
        let source = Arc::new(
            ScriptedSource::new()
                .with_once_fixes([
                    Fix::new(Position::new(1.0, 1.0), 5.0),
                    Fix::new(Position::new(2.0, 2.0), 5.0),
                ])
                .with_stream_held_open(Vec::new()),
        );
        let mut controller = controller_with(source, Arc::clone(&store));

        must(controller.start_trip("BUS1").await);
        controller.end_trip().await;
        must(controller.start_trip("BUS2").await);

        assert_eq!(controller.state(), TripState::Active);
        assert_eq!(
            controller.snapshot().identifier.as_deref(),
            Some("BUS2")
        );
        assert_eq!(store.publish_count(), 2);
    }
}
