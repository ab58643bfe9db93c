//! Run a driver and a rider side by side over one store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::info;

use transitline_core::{Observer, ObserverConfig, ReporterConfig, TripController};
use transitline_source::{SyntheticConfig, SyntheticSource};
use transitline_transport::{LocationStore, MemoryStore};

use crate::output;

pub async fn execute(bus_id: &str, duration_secs: u64, cadence_ms: u64, json: bool) -> Result<()> {
    let store: Arc<dyn LocationStore> = Arc::new(MemoryStore::new());
    let synthetic = SyntheticConfig {
        cadence: Duration::from_millis(cadence_ms),
        ..SyntheticConfig::default()
    };
    let driver_source = Arc::new(SyntheticSource::with_config(synthetic.clone())?);
    let rider_source = Arc::new(SyntheticSource::new());

    let mut trip = TripController::new(
        driver_source,
        Arc::clone(&store),
        ReporterConfig {
            synthetic,
            ..ReporterConfig::default()
        },
    );
    let mut observer = Observer::new(
        rider_source,
        Arc::clone(&store),
        ObserverConfig {
            poll_interval: Duration::from_millis(cadence_ms),
            local_sample_interval: Duration::from_millis(cadence_ms),
            ..ObserverConfig::default()
        },
    );

    trip.start_trip(bus_id).await?;
    observer.watch(bus_id)?;
    info!(bus_id, "demo running, one store and two pipelines");

    for _ in 0..duration_secs.max(1) {
        sleep(Duration::from_secs(1)).await;
        output::print_reporter(&trip.snapshot(), json);
        output::print_observer(&observer.snapshot(), json);
    }

    observer.unwatch();
    trip.end_trip().await;
    Ok(())
}
