//! Read-only state snapshots for the presentation boundary.
//!
//! Snapshots are cheap clones taken under the pipeline state lock.
//! They carry everything a rendering layer needs and nothing it can
//! mutate.

use chrono::{DateTime, Utc};

use transitline_errors::LastError;
use transitline_geo::Position;

/// Lifecycle state of a trip / reporter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripState {
    /// Not reporting.
    #[default]
    Idle,
    /// Reporting under an identifier.
    Active,
}

impl TripState {
    /// True when the trip is active.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, TripState::Active)
    }
}

/// Snapshot of the reporter pipeline.
#[derive(Debug, Clone, Default)]
pub struct ReporterSnapshot {
    /// Lifecycle state.
    pub state: TripState,
    /// Identifier being reported under, while active.
    pub identifier: Option<String>,
    /// True when the synthetic source has taken over.
    pub degraded: bool,
    /// Last successfully published position.
    pub last_position: Option<Position>,
    /// When the last successful publish happened.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Publish attempts that failed since the trip started.
    pub publish_failures: u64,
    /// Most recent surfaced error, if any.
    pub last_error: Option<LastError>,
}

/// Snapshot of the observer pipeline.
#[derive(Debug, Clone, Default)]
pub struct ObserverSnapshot {
    /// Identifier being watched, while watching.
    pub identifier: Option<String>,
    /// Last known remote position of the watched bus. `None` means no
    /// data yet, the bus stopped reporting, or the latest fetch
    /// failed; `last_error` distinguishes the failure cases.
    pub remote_position: Option<Position>,
    /// Last accepted position of the observing device itself.
    pub local_position: Option<Position>,
    /// When the last remote fetch outcome was applied.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Most recent fetch error, if the latest outcome was a failure.
    pub last_error: Option<LastError>,
}

impl ObserverSnapshot {
    /// True while watching but before any remote data or error has
    /// arrived.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.identifier.is_some()
            && self.remote_position.is_none()
            && self.last_error.is_none()
            && self.last_updated_at.is_none()
    }
}
