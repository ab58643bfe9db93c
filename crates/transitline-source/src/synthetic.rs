//! Synthetic position source.
//!
//! Generates a deterministic north-east drift from a seed position,
//! one step per cadence tick. Used as the degraded-mode fallback when
//! the real device source is unusable, and by demo tooling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use transitline_errors::SourceError;
use transitline_geo::Position;

use crate::{Fix, FixReceiver, PositionSource};

/// Default seed latitude in decimal degrees.
pub const DEFAULT_SEED_LAT: f64 = 28.6139;
/// Default seed longitude in decimal degrees.
pub const DEFAULT_SEED_LNG: f64 = 77.2090;
/// Default per-tick coordinate increment in decimal degrees.
pub const DEFAULT_STEP_DEG: f64 = 0.0005;
/// Default tick cadence.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(5);
/// Accuracy radius reported for synthetic fixes. Synthetic positions
/// are exact.
pub const SYNTHETIC_ACCURACY_M: f64 = 0.0;

const STREAM_CHANNEL_CAPACITY: usize = 16;

/// Configuration for [`SyntheticSource`].
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Starting position of the drift.
    pub seed: Position,
    /// Added to both coordinates on every tick.
    pub step_deg: f64,
    /// Interval between stream ticks.
    pub cadence: Duration,
    /// Accuracy radius stamped on every generated fix.
    pub accuracy_m: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: Position::new(DEFAULT_SEED_LAT, DEFAULT_SEED_LNG),
            step_deg: DEFAULT_STEP_DEG,
            cadence: DEFAULT_CADENCE,
            accuracy_m: SYNTHETIC_ACCURACY_M,
        }
    }
}

impl SyntheticConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SourceError> {
        if !self.seed.latitude.is_finite() || self.seed.latitude.abs() > 90.0 {
            return Err(SourceError::unavailable(format!(
                "seed latitude out of range: {}",
                self.seed.latitude
            )));
        }
        if !self.seed.longitude.is_finite() || self.seed.longitude.abs() > 180.0 {
            return Err(SourceError::unavailable(format!(
                "seed longitude out of range: {}",
                self.seed.longitude
            )));
        }
        if !self.step_deg.is_finite() || self.step_deg <= 0.0 {
            return Err(SourceError::unavailable(format!(
                "step must be a positive number of degrees, got {}",
                self.step_deg
            )));
        }
        if self.cadence.is_zero() {
            return Err(SourceError::unavailable("cadence must be non-zero"));
        }
        if !self.accuracy_m.is_finite() || self.accuracy_m < 0.0 {
            return Err(SourceError::unavailable(format!(
                "accuracy must be non-negative, got {}",
                self.accuracy_m
            )));
        }
        Ok(())
    }
}

/// Deterministic drifting position source.
///
/// Successive fixes advance a shared tick counter, so a mix of
/// one-shot requests and streaming still produces a single monotonic
/// drift rather than restarting from the seed.
pub struct SyntheticSource {
    config: SyntheticConfig,
    ticks: AtomicU64,
}

impl SyntheticSource {
    /// Create a source with the default seed, step, and cadence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SyntheticConfig::default(),
            ticks: AtomicU64::new(0),
        }
    }

    /// Create a source from a validated configuration.
    pub fn with_config(config: SyntheticConfig) -> Result<Self, SourceError> {
        config.validate()?;
        Ok(Self {
            config,
            ticks: AtomicU64::new(0),
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    fn fix_for_tick(config: &SyntheticConfig, tick: u64) -> Fix {
        let offset = config.step_deg * tick as f64;
        let position = Position::new(
            config.seed.latitude + offset,
            config.seed.longitude + offset,
        );
        Fix::new(position, config.accuracy_m)
    }

    fn next_fix(&self) -> Fix {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        Self::fix_for_tick(&self.config, tick)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionSource for SyntheticSource {
    fn source_id(&self) -> &str {
        "synthetic"
    }

    async fn request_once(&self, _wait: Duration) -> Result<Fix, SourceError> {
        Ok(self.next_fix())
    }

    async fn stream_fixes(&self) -> Result<FixReceiver, SourceError> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let config = self.config.clone();
        let start_tick = self.ticks.load(Ordering::Relaxed);

        tokio::spawn(async move {
            info!(
                seed_lat = config.seed.latitude,
                seed_lng = config.seed.longitude,
                step_deg = config.step_deg,
                "synthetic source streaming"
            );
            let mut interval = tokio::time::interval(config.cadence);
            let mut tick = start_tick;

            loop {
                interval.tick().await;
                let fix = SyntheticSource::fix_for_tick(&config, tick);
                if tx.send(fix).await.is_err() {
                    debug!("receiver dropped, stopping synthetic stream");
                    break;
                }
                tick = tick.saturating_add(1);
            }
            info!("stopped synthetic stream");
        });

        Ok(rx)
    }
}
