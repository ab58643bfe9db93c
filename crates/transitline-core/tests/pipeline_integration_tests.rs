//! End-to-end tests pairing both pipelines over one in-memory store.
//!
//! Coverage areas:
//! 1. Round trip — a reporting driver becomes visible to a watching
//!    rider through the shared store.
//! 2. Degraded round trip — a driver without a usable source still
//!    produces a moving synthetic position for the rider.
//! 3. Retraction — ending a trip clears the rider's remote view
//!    without raising an error.
//! 4. Trip controller — lifecycle transitions against the real store,
//!    including the wire payload shape.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use transitline_core::{
    Observer, ObserverConfig, Reporter, ReporterConfig, TripController, TripState,
};
use transitline_geo::Position;
use transitline_source::{Fix, SyntheticConfig};
use transitline_test_helpers::{ScriptedSource, UnavailableSource, must, must_some};
use transitline_transport::{LocationStore, MemoryStore, wire};

fn fast_reporter_config() -> ReporterConfig {
    ReporterConfig {
        synthetic: SyntheticConfig {
            cadence: Duration::from_millis(10),
            ..SyntheticConfig::default()
        },
        ..ReporterConfig::default()
    }
}

fn fast_observer_config() -> ObserverConfig {
    ObserverConfig {
        poll_interval: Duration::from_millis(10),
        local_sample_interval: Duration::from_millis(10),
        ..ObserverConfig::default()
    }
}

#[tokio::test]
async fn test_reported_position_reaches_watcher() {
    let store = Arc::new(MemoryStore::new());
    let driver_source = Arc::new(
        ScriptedSource::new()
            .with_once_fixes([Fix::new(Position::new(28.6139, 77.2090), 5.0)])
            .with_stream_held_open(Vec::new()),
    );
    let rider_source = Arc::new(
        ScriptedSource::new().with_once_fixes([Fix::new(Position::new(28.6100, 77.2000), 5.0)]),
    );

    let mut reporter = Reporter::new(
        driver_source,
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_reporter_config(),
    );
    let mut observer = Observer::new(
        rider_source,
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_observer_config(),
    );

    must(reporter.start("BUS7").await);
    must(observer.watch("BUS7"));
    sleep(Duration::from_millis(40)).await;

    let snapshot = observer.snapshot();
    assert_eq!(
        snapshot.remote_position,
        Some(Position::new(28.6139, 77.2090))
    );
    assert_eq!(snapshot.local_position, Some(Position::new(28.6100, 77.2000)));
    assert!(snapshot.last_error.is_none());

    reporter.stop().await;
    observer.unwatch();
}

#[tokio::test]
async fn test_degraded_driver_still_moves_for_watcher() {
    let store = Arc::new(MemoryStore::new());
    let mut reporter = Reporter::new(
        Arc::new(UnavailableSource::new()),
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_reporter_config(),
    );
    let mut observer = Observer::new(
        Arc::new(UnavailableSource::new()),
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_observer_config(),
    );

    must(reporter.start("BUS7").await);
    assert!(reporter.is_degraded());
    must(observer.watch("BUS7"));

    sleep(Duration::from_millis(40)).await;
    let first = must_some(observer.snapshot().remote_position, "no remote position yet");

    sleep(Duration::from_millis(40)).await;
    let second = must_some(observer.snapshot().remote_position, "remote position vanished");

    assert!(
        second.latitude > first.latitude,
        "synthetic drift should advance between polls"
    );

    reporter.stop().await;
    observer.unwatch();
}

#[tokio::test]
async fn test_trip_end_clears_watcher_view() {
    let store = Arc::new(MemoryStore::new());
    let driver_source = Arc::new(
        ScriptedSource::new()
            .with_once_fixes([Fix::new(Position::new(19.0760, 72.8777), 5.0)])
            .with_stream_held_open(Vec::new()),
    );

    let mut reporter = Reporter::new(
        driver_source,
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_reporter_config(),
    );
    let mut observer = Observer::new(
        Arc::new(UnavailableSource::new()),
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_observer_config(),
    );

    must(reporter.start("BUS2").await);
    must(observer.watch("BUS2"));
    sleep(Duration::from_millis(30)).await;
    assert!(observer.snapshot().remote_position.is_some());

    reporter.stop().await;
    sleep(Duration::from_millis(30)).await;

    let snapshot = observer.snapshot();
    assert!(snapshot.remote_position.is_none(), "retraction should clear the view");
    assert!(snapshot.last_error.is_none(), "absence is data, not an error");

    observer.unwatch();
}

#[tokio::test]
async fn test_trip_controller_round_trip_over_real_store() {
    let store = Arc::new(MemoryStore::new());
    let driver_source = Arc::new(
        ScriptedSource::new()
            .with_once_fixes([Fix::new(Position::new(28.6139, 77.2090), 5.0)])
            .with_stream_held_open(Vec::new()),
    );
    let mut controller = TripController::new(
        driver_source,
        Arc::clone(&store) as Arc<dyn LocationStore>,
        fast_reporter_config(),
    );

    must(controller.start_trip("BUS9").await);
    assert_eq!(controller.state(), TripState::Active);

    let payload = must_some(
        must(store.fetch_current("BUS9").await),
        "no payload published",
    );
    let position = must(wire::decode_position(&payload));
    assert_eq!(position, Position::new(28.6139, 77.2090));

    controller.end_trip().await;
    assert_eq!(controller.state(), TripState::Idle);
    assert!(must(store.fetch_current("BUS9").await).is_none());
}
