//! Reporter pipeline.
//!
//! Publishes the driver's position under a bus identifier. Fixes flow
//! from the device source through the accuracy gate straight to the
//! store; there is no distance filter on this side, freshness wins
//! over bandwidth. Publish failures are counted and surfaced but
//! never stop the pipeline. When the source is unusable at start or
//! dies midway, the synthetic source takes over on the same transport
//! path and the session is marked degraded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use transitline_errors::{LastError, SourceError, TrackingError, TrackingResult};
use transitline_geo::Position;
use transitline_source::{
    DEFAULT_ACCURACY_LIMIT_M, Fix, PositionSource, SyntheticConfig, SyntheticSource,
    request_once_bounded,
};
use transitline_transport::LocationStore;

use crate::snapshot::{ReporterSnapshot, TripState};
use crate::validate_identifier;

/// How long the pipeline waits for the initial fix before degrading.
pub const DEFAULT_INITIAL_FIX_WAIT: Duration = Duration::from_secs(10);

/// Reporter pipeline configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Bound on the initial fix wait.
    pub initial_fix_wait: Duration,
    /// Inclusive accuracy gate applied to every fix.
    pub accuracy_limit_m: f64,
    /// Synthetic source used in degraded mode.
    pub synthetic: SyntheticConfig,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            initial_fix_wait: DEFAULT_INITIAL_FIX_WAIT,
            accuracy_limit_m: DEFAULT_ACCURACY_LIMIT_M,
            synthetic: SyntheticConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ReporterState {
    session: ReporterSnapshot,
    apply_seq: u64,
}

/// State shared between the pipeline handle and its spawned task.
#[derive(Debug, Default)]
struct ReporterShared {
    state: Mutex<ReporterState>,
    generation: AtomicU64,
}

impl ReporterShared {
    /// Single mutation point. Completions carry the generation they
    /// were issued under; once the generation has moved on the
    /// completion is discarded without touching state.
    fn apply(&self, generation: u64, mutate: impl FnOnce(&mut ReporterSnapshot)) -> bool {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(generation, "discarding completion from a stopped session");
            return false;
        }
        state.apply_seq += 1;
        mutate(&mut state.session);
        true
    }
}

/// Driver-side position reporting pipeline.
pub struct Reporter {
    config: ReporterConfig,
    source: Arc<dyn PositionSource>,
    store: Arc<dyn LocationStore>,
    shared: Arc<ReporterShared>,
    task: Option<JoinHandle<()>>,
}

impl Reporter {
    /// Create an idle reporter over the given source and store.
    #[must_use]
    pub fn new(
        source: Arc<dyn PositionSource>,
        store: Arc<dyn LocationStore>,
        config: ReporterConfig,
    ) -> Self {
        Self {
            config,
            source,
            store,
            shared: Arc::new(ReporterShared::default()),
            task: None,
        }
    }

    /// Start reporting under `identifier`.
    ///
    /// Rejects an empty identifier synchronously. Waits for one
    /// initial fix within the configured bound and publishes it
    /// immediately when it passes the accuracy gate; a failed initial
    /// fix degrades the session to the synthetic source instead of
    /// blocking the start. Starting while already active is a no-op.
    pub async fn start(&mut self, identifier: &str) -> TrackingResult<()> {
        let identifier = validate_identifier(identifier)?;
        if self.shared.state.lock().session.state.is_active() {
            warn!(bus_id = %identifier, "start requested while already active; ignoring");
            return Ok(());
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        {
            let mut state = self.shared.state.lock();
            state.session = ReporterSnapshot {
                state: TripState::Active,
                identifier: Some(identifier.clone()),
                ..ReporterSnapshot::default()
            };
        }
        info!(bus_id = %identifier, "starting position reporting");

        match request_once_bounded(self.source.as_ref(), self.config.initial_fix_wait).await {
            Ok(fix) => {
                if fix.meets_accuracy(self.config.accuracy_limit_m) {
                    publish_position(
                        self.store.as_ref(),
                        &self.shared,
                        generation,
                        &identifier,
                        fix.position,
                    )
                    .await;
                } else {
                    debug!(
                        bus_id = %identifier,
                        accuracy_m = fix.accuracy_m,
                        "initial fix rejected by accuracy gate"
                    );
                }
            }
            Err(err) => {
                let tracked = TrackingError::from(err);
                warn!(
                    bus_id = %identifier,
                    error = %tracked,
                    "initial fix failed; entering degraded mode"
                );
                self.shared.apply(generation, |session| {
                    session.degraded = true;
                    session.last_error = Some(LastError::from_error(&tracked));
                });
            }
        }

        let degraded = self.shared.state.lock().session.degraded;
        let shared = Arc::clone(&self.shared);
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let config = self.config.clone();

        self.task = Some(tokio::spawn(async move {
            if degraded {
                run_degraded(&shared, store.as_ref(), &config, generation, &identifier).await;
            } else {
                run_live(
                    &shared,
                    source.as_ref(),
                    store.as_ref(),
                    &config,
                    generation,
                    &identifier,
                )
                .await;
            }
        }));

        Ok(())
    }

    /// Stop reporting.
    ///
    /// Bumps the generation and aborts the acquisition task before
    /// anything else, so in-flight completions cannot touch state,
    /// then resets the session and issues a best-effort retraction.
    /// Stopping an idle reporter is a no-op. Idempotent.
    pub async fn stop(&mut self) {
        let identifier = {
            let state = self.shared.state.lock();
            if !state.session.state.is_active() {
                debug!("stop requested while idle; nothing to do");
                return;
            }
            state.session.identifier.clone()
        };

        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.state.lock().session = ReporterSnapshot::default();

        if let Some(identifier) = identifier {
            info!(bus_id = %identifier, "stopping position reporting");
            if let Err(err) = self.store.retract(&identifier).await {
                warn!(bus_id = %identifier, error = %err, "retraction failed during stop");
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TripState {
        self.shared.state.lock().session.state
    }

    /// True when the synthetic source has taken over.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.shared.state.lock().session.degraded
    }

    /// Clone out a read-only snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> ReporterSnapshot {
        self.shared.state.lock().session.clone()
    }
}

async fn run_live(
    shared: &ReporterShared,
    source: &dyn PositionSource,
    store: &dyn LocationStore,
    config: &ReporterConfig,
    generation: u64,
    identifier: &str,
) {
    match source.stream_fixes().await {
        Ok(mut fixes) => {
            while let Some(fix) = fixes.recv().await {
                handle_fix(shared, store, config, generation, identifier, fix).await;
            }
            fall_back(
                shared,
                store,
                config,
                generation,
                identifier,
                SourceError::unavailable("position stream ended"),
            )
            .await;
        }
        Err(err) => {
            fall_back(shared, store, config, generation, identifier, err).await;
        }
    }
}

/// The one place the degraded flag is set for a running session.
async fn fall_back(
    shared: &ReporterShared,
    store: &dyn LocationStore,
    config: &ReporterConfig,
    generation: u64,
    identifier: &str,
    cause: SourceError,
) {
    let tracked = TrackingError::from(cause);
    warn!(
        bus_id = %identifier,
        error = %tracked,
        "device source lost; falling back to synthetic source"
    );
    if !shared.apply(generation, |session| {
        session.degraded = true;
        session.last_error = Some(LastError::from_error(&tracked));
    }) {
        return;
    }
    run_degraded(shared, store, config, generation, identifier).await;
}

async fn run_degraded(
    shared: &ReporterShared,
    store: &dyn LocationStore,
    config: &ReporterConfig,
    generation: u64,
    identifier: &str,
) {
    let synthetic = match SyntheticSource::with_config(config.synthetic.clone()) {
        Ok(source) => source,
        Err(err) => {
            warn!(error = %err, "synthetic configuration rejected; reporting stalled");
            return;
        }
    };
    match synthetic.stream_fixes().await {
        Ok(mut fixes) => {
            while let Some(fix) = fixes.recv().await {
                handle_fix(shared, store, config, generation, identifier, fix).await;
            }
        }
        Err(err) => {
            warn!(error = %err, "synthetic stream unavailable; reporting stalled");
        }
    }
}

async fn handle_fix(
    shared: &ReporterShared,
    store: &dyn LocationStore,
    config: &ReporterConfig,
    generation: u64,
    identifier: &str,
    fix: Fix,
) {
    if !fix.meets_accuracy(config.accuracy_limit_m) {
        debug!(
            bus_id = %identifier,
            accuracy_m = fix.accuracy_m,
            limit_m = config.accuracy_limit_m,
            "fix rejected by accuracy gate"
        );
        return;
    }
    publish_position(store, shared, generation, identifier, fix.position).await;
}

async fn publish_position(
    store: &dyn LocationStore,
    shared: &ReporterShared,
    generation: u64,
    identifier: &str,
    position: Position,
) {
    match store.publish(identifier, position).await {
        Ok(()) => {
            shared.apply(generation, |session| {
                session.last_position = Some(position);
                session.last_updated_at = Some(Utc::now());
                session.last_error = None;
            });
        }
        Err(err) => {
            let tracked = TrackingError::from(err);
            warn!(
                bus_id = %identifier,
                error = %tracked,
                "publish failed; reporting continues"
            );
            shared.apply(generation, |session| {
                session.publish_failures += 1;
                session.last_error = Some(LastError::from_error(&tracked));
            });
        }
    }
}
