//! Observer pipeline.
//!
//! Watches a bus identifier from the rider's side. Each watch runs
//! two independent tasks: a remote poller that fetches the published
//! position on a fixed cadence, first fetch immediate, and a local
//! sampler that reads the device position on a delayed cadence and
//! smooths it through the distance filter. A failure in one task
//! never disturbs the other's view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use transitline_errors::{LastError, TrackingError, TrackingResult};
use transitline_geo::DistanceFilter;
use transitline_source::{DEFAULT_ACCURACY_LIMIT_M, PositionSource, request_once_bounded};
use transitline_transport::{LocationStore, wire};

use crate::snapshot::ObserverSnapshot;
use crate::validate_identifier;

/// Cadence of the remote position poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Cadence of the local device sample.
pub const DEFAULT_LOCAL_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// How long each local sample may wait for a fix.
pub const DEFAULT_FIX_WAIT: Duration = Duration::from_secs(10);

/// Minimum movement before a new local position replaces the old one.
pub const DEFAULT_DISTANCE_THRESHOLD_M: f64 = 5.0;

/// Observer pipeline configuration.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Remote poll cadence. The first poll fires immediately.
    pub poll_interval: Duration,
    /// Local sample cadence. The first sample fires one period in.
    pub local_sample_interval: Duration,
    /// Bound on each local fix wait.
    pub fix_wait: Duration,
    /// Inclusive accuracy gate applied to local fixes.
    pub accuracy_limit_m: f64,
    /// Distance filter threshold for local positions.
    pub distance_threshold_m: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            local_sample_interval: DEFAULT_LOCAL_SAMPLE_INTERVAL,
            fix_wait: DEFAULT_FIX_WAIT,
            accuracy_limit_m: DEFAULT_ACCURACY_LIMIT_M,
            distance_threshold_m: DEFAULT_DISTANCE_THRESHOLD_M,
        }
    }
}

#[derive(Debug, Default)]
struct ObserverState {
    watch: ObserverSnapshot,
    apply_seq: u64,
}

/// State shared between the pipeline handle and its spawned tasks.
#[derive(Debug, Default)]
struct ObserverShared {
    state: Mutex<ObserverState>,
    generation: AtomicU64,
}

impl ObserverShared {
    /// Single mutation point. Completions carry the generation they
    /// were issued under; once the generation has moved on the
    /// completion is discarded without touching state.
    fn apply(&self, generation: u64, mutate: impl FnOnce(&mut ObserverSnapshot)) -> bool {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(generation, "discarding completion from an ended watch");
            return false;
        }
        state.apply_seq += 1;
        mutate(&mut state.watch);
        true
    }
}

/// Rider-side position watching pipeline.
pub struct Observer {
    config: ObserverConfig,
    source: Arc<dyn PositionSource>,
    store: Arc<dyn LocationStore>,
    shared: Arc<ObserverShared>,
    remote_task: Option<JoinHandle<()>>,
    local_task: Option<JoinHandle<()>>,
}

impl Observer {
    /// Create an idle observer over the given source and store.
    #[must_use]
    pub fn new(
        source: Arc<dyn PositionSource>,
        store: Arc<dyn LocationStore>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            config,
            source,
            store,
            shared: Arc::new(ObserverShared::default()),
            remote_task: None,
            local_task: None,
        }
    }

    /// Start watching `identifier`.
    ///
    /// Rejects an empty identifier synchronously. Watching while
    /// already watching is a no-op.
    pub fn watch(&mut self, identifier: &str) -> TrackingResult<()> {
        let identifier = validate_identifier(identifier)?;
        if self.shared.state.lock().watch.identifier.is_some() {
            warn!(bus_id = %identifier, "watch requested while already watching; ignoring");
            return Ok(());
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        {
            let mut state = self.shared.state.lock();
            state.watch = ObserverSnapshot {
                identifier: Some(identifier.clone()),
                ..ObserverSnapshot::default()
            };
        }
        info!(bus_id = %identifier, "watching bus position");

        let shared = Arc::clone(&self.shared);
        let store = Arc::clone(&self.store);
        let poll_interval = self.config.poll_interval;
        let remote_id = identifier.clone();
        self.remote_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                poll_remote(store.as_ref(), &shared, generation, &remote_id).await;
            }
        }));

        let shared = Arc::clone(&self.shared);
        let source = Arc::clone(&self.source);
        let config = self.config.clone();
        self.local_task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + config.local_sample_interval;
            let mut ticker = tokio::time::interval_at(start, config.local_sample_interval);
            let mut filter = DistanceFilter::new(config.distance_threshold_m);
            loop {
                ticker.tick().await;
                sample_local(source.as_ref(), &shared, &config, generation, &mut filter).await;
            }
        }));

        Ok(())
    }

    /// Stop watching.
    ///
    /// Bumps the generation and aborts both tasks before resetting the
    /// snapshot, so in-flight completions cannot touch state. Stopping
    /// an idle observer is a no-op. Idempotent.
    pub fn unwatch(&mut self) {
        let identifier = {
            let state = self.shared.state.lock();
            match state.watch.identifier.clone() {
                Some(identifier) => identifier,
                None => {
                    debug!("unwatch requested while idle; nothing to do");
                    return;
                }
            }
        };

        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.remote_task.take() {
            task.abort();
        }
        if let Some(task) = self.local_task.take() {
            task.abort();
        }
        self.shared.state.lock().watch = ObserverSnapshot::default();
        info!(bus_id = %identifier, "stopped watching");
    }

    /// True while a watch is running.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.shared.state.lock().watch.identifier.is_some()
    }

    /// Clone out a read-only snapshot of the watch.
    #[must_use]
    pub fn snapshot(&self) -> ObserverSnapshot {
        self.shared.state.lock().watch.clone()
    }
}

async fn poll_remote(
    store: &dyn LocationStore,
    shared: &ObserverShared,
    generation: u64,
    identifier: &str,
) {
    match store.fetch_current(identifier).await {
        Ok(Some(payload)) => match wire::decode_position(&payload) {
            Ok(position) => {
                shared.apply(generation, |watch| {
                    watch.remote_position = Some(position);
                    watch.last_updated_at = Some(Utc::now());
                    watch.last_error = None;
                });
            }
            Err(err) => {
                warn!(bus_id = %identifier, error = %err, "malformed remote payload");
                shared.apply(generation, |watch| {
                    watch.remote_position = None;
                    watch.last_updated_at = Some(Utc::now());
                    watch.last_error = Some(LastError::from_error(&err));
                });
            }
        },
        // Not found is an answer, not a failure. The bus is simply
        // not reporting.
        Ok(None) => {
            shared.apply(generation, |watch| {
                watch.remote_position = None;
                watch.last_updated_at = Some(Utc::now());
                watch.last_error = None;
            });
        }
        Err(err) => {
            let tracked = TrackingError::from(err);
            warn!(bus_id = %identifier, error = %tracked, "remote fetch failed");
            shared.apply(generation, |watch| {
                watch.remote_position = None;
                watch.last_updated_at = Some(Utc::now());
                watch.last_error = Some(LastError::from_error(&tracked));
            });
        }
    }
}

async fn sample_local(
    source: &dyn PositionSource,
    shared: &ObserverShared,
    config: &ObserverConfig,
    generation: u64,
    filter: &mut DistanceFilter,
) {
    match request_once_bounded(source, config.fix_wait).await {
        Ok(fix) => {
            if !fix.meets_accuracy(config.accuracy_limit_m) {
                debug!(
                    accuracy_m = fix.accuracy_m,
                    limit_m = config.accuracy_limit_m,
                    "local fix rejected by accuracy gate"
                );
                return;
            }
            if !filter.accept(fix.position) {
                debug!("local fix within distance threshold; keeping previous");
                return;
            }
            shared.apply(generation, |watch| {
                watch.local_position = Some(fix.position);
            });
        }
        Err(err) => {
            debug!(error = %err, "local fix unavailable; remote view unaffected");
        }
    }
}
