//! Location sampling and reconciliation pipelines.
//!
//! This crate owns the driver-side [`Reporter`], the rider-side
//! [`Observer`], the [`TripController`] lifecycle wrapper, and the
//! read-only snapshots the presentation boundary consumes.
//!
//! Both pipelines follow the same concurrency discipline: spawned
//! tasks carry the pipeline generation captured when they were
//! started, every state mutation goes through a single apply point
//! that takes the state lock and checks the generation, and stopping
//! a pipeline bumps the generation before aborting its tasks so
//! completions that outlive the stop are discarded rather than
//! applied.

use transitline_errors::{TrackingError, TrackingResult};

pub mod observer;
pub mod reporter;
pub mod snapshot;
pub mod trip;

pub use observer::{Observer, ObserverConfig};
pub use reporter::{Reporter, ReporterConfig};
pub use snapshot::{ObserverSnapshot, ReporterSnapshot, TripState};
pub use trip::TripController;

/// Validate a bus identifier, returning the trimmed form.
///
/// Empty and whitespace-only identifiers are rejected before any I/O
/// is attempted.
pub fn validate_identifier(raw: &str) -> TrackingResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackingError::invalid_identifier(
            "bus identifier must not be empty",
        ));
    }
    Ok(trimmed.to_owned())
}
