//! Drive a synthetic reporter against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::info;

use transitline_core::{ReporterConfig, TripController};
use transitline_source::{SyntheticConfig, SyntheticSource};
use transitline_transport::MemoryStore;

use crate::output;

pub async fn execute(bus_id: &str, duration_secs: u64, cadence_ms: u64, json: bool) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let synthetic = SyntheticConfig {
        cadence: Duration::from_millis(cadence_ms),
        ..SyntheticConfig::default()
    };
    let source = Arc::new(SyntheticSource::with_config(synthetic.clone())?);
    let config = ReporterConfig {
        synthetic,
        ..ReporterConfig::default()
    };
    let mut trip = TripController::new(source, store, config);

    trip.start_trip(bus_id).await?;
    info!(bus_id, "trip started");

    for _ in 0..duration_secs.max(1) {
        sleep(Duration::from_secs(1)).await;
        output::print_reporter(&trip.snapshot(), json);
    }

    trip.end_trip().await;
    info!(bus_id, "trip ended");
    output::print_reporter(&trip.snapshot(), json);
    Ok(())
}
