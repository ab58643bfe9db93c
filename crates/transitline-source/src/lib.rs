//! Device position sources.
//!
//! This crate defines the trait the tracking pipelines use to obtain
//! position fixes from a device, plus the synthetic source that stands
//! in for real positioning hardware in degraded mode and in demos.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use transitline_errors::SourceError;
use transitline_geo::Position;

pub mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Horizontal accuracy limit in meters; fixes reported with a worse
/// radius are discarded by the pipelines. The limit is inclusive.
pub const DEFAULT_ACCURACY_LIMIT_M: f64 = 30.0;

/// Shared type alias for outbound fix streams.
pub type FixReceiver = mpsc::Receiver<Fix>;

/// A single position fix from a device source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Where the device believes it is.
    pub position: Position,
    /// Estimated horizontal accuracy radius in meters.
    pub accuracy_m: f64,
    /// When the fix was captured.
    pub captured_at: DateTime<Utc>,
}

impl Fix {
    /// Create a fix captured now.
    #[must_use]
    pub fn new(position: Position, accuracy_m: f64) -> Self {
        Self {
            position,
            accuracy_m,
            captured_at: Utc::now(),
        }
    }

    /// True when the accuracy radius is within the given limit,
    /// inclusive.
    #[must_use]
    pub fn meets_accuracy(&self, limit_m: f64) -> bool {
        self.accuracy_m <= limit_m
    }
}

/// Position source trait for device-specific fix providers.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Identifier for logs and diagnostics.
    fn source_id(&self) -> &str;

    /// Obtain a single fix, waiting at most `wait` for one to arrive.
    async fn request_once(&self, wait: Duration) -> Result<Fix, SourceError>;

    /// Start a continuous fix stream. The producer stops when the
    /// returned receiver is dropped.
    async fn stream_fixes(&self) -> Result<FixReceiver, SourceError>;
}

/// Request one fix with the wait enforced at the call site, so a
/// source that ignores its `wait` argument still cannot stall the
/// caller past the bound.
pub async fn request_once_bounded(
    source: &dyn PositionSource,
    wait: Duration,
) -> Result<Fix, SourceError> {
    match tokio::time::timeout(wait, source.request_once(wait)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SourceError::timeout(wait)),
    }
}
