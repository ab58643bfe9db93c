//! Centralized error types for transitline.
//!
//! This crate provides the error taxonomy shared by the tracking
//! pipelines:
//!
//! - [`source`]: failures of the device position source
//! - [`transport`]: failures of the location store transport
//! - [`tracking`]: the top-level error, classification kinds, and the
//!   snapshot-facing [`LastError`] record
//!
//! Pipelines report errors through state snapshots rather than
//! panicking, so every error here carries a human-readable cause and
//! maps onto a coarse [`ErrorKind`] that presentation layers can
//! switch on without string matching.

pub mod source;
pub mod tracking;
pub mod transport;

pub use source::SourceError;
pub use tracking::{ErrorKind, LastError, TrackingError};
pub use transport::TransportError;

/// A specialized `Result` type for tracking operations.
pub type TrackingResult<T> = std::result::Result<T, TrackingError>;
