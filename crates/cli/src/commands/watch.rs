//! Watch a bus identifier and print the rider's view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::info;

use transitline_core::{Observer, ObserverConfig};
use transitline_source::SyntheticSource;
use transitline_transport::MemoryStore;

use crate::output;

pub async fn execute(bus_id: &str, duration_secs: u64, poll_ms: u64, json: bool) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(SyntheticSource::new());
    let config = ObserverConfig {
        poll_interval: Duration::from_millis(poll_ms),
        local_sample_interval: Duration::from_millis(poll_ms),
        ..ObserverConfig::default()
    };
    let mut observer = Observer::new(source, store, config);

    observer.watch(bus_id)?;
    info!(bus_id, "watching");

    for _ in 0..duration_secs.max(1) {
        sleep(Duration::from_secs(1)).await;
        output::print_observer(&observer.snapshot(), json);
    }

    observer.unwatch();
    Ok(())
}
