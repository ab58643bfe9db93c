//! Top-level tracking error, classification kinds, and the
//! snapshot-facing last-error record.

use core::fmt;

use thiserror::Error;

use crate::{SourceError, TransportError};

/// Top-level error type wrapping all tracking sub-errors.
#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    /// The bus identifier failed validation before any I/O happened.
    #[error("invalid bus identifier: {0}")]
    InvalidIdentifier(String),

    /// Device position source failure.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Location store transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The store answered with a payload that does not decode to a
    /// position.
    #[error("invalid position data: {0}")]
    InvalidData(String),
}

impl TrackingError {
    /// Create an invalid identifier error.
    #[must_use]
    pub fn invalid_identifier(reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier(reason.into())
    }

    /// Create an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData(reason.into())
    }

    /// Classify this error for presentation layers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::Source(SourceError::Timeout(_)) => ErrorKind::Timeout,
            Self::Source(_) => ErrorKind::PermissionOrUnavailable,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidData(_) => ErrorKind::InvalidData,
        }
    }
}

/// Coarse error classification for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bus identifier failed validation.
    InvalidIdentifier,
    /// Position source is forbidden or missing.
    PermissionOrUnavailable,
    /// Location store could not be used.
    Transport,
    /// Store payload did not decode to a position.
    InvalidData,
    /// A bounded wait elapsed without a result.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidIdentifier => write!(f, "invalid-identifier"),
            ErrorKind::PermissionOrUnavailable => write!(f, "permission-or-unavailable"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::InvalidData => write!(f, "invalid-data"),
            ErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// The most recent error a pipeline surfaced, as stored in state
/// snapshots.
///
/// Kept as a kind plus a rendered message so snapshots stay `Clone`
/// and presentation code never needs the full error value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    /// Coarse classification.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl LastError {
    /// Record an error as the pipeline's last error.
    #[must_use]
    pub fn from_error(err: &TrackingError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kind_classification() {
        let err = TrackingError::invalid_identifier("empty");
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

        let err = TrackingError::from(SourceError::permission_denied("no"));
        assert_eq!(err.kind(), ErrorKind::PermissionOrUnavailable);

        let err = TrackingError::from(SourceError::unavailable("no gps"));
        assert_eq!(err.kind(), ErrorKind::PermissionOrUnavailable);

        let err = TrackingError::from(SourceError::timeout(Duration::from_secs(10)));
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = TrackingError::from(TransportError::unreachable("down"));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = TrackingError::invalid_data("lat is a string");
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_last_error_carries_message() {
        let err = TrackingError::from(TransportError::rejected("bad id"));
        let last = LastError::from_error(&err);
        assert_eq!(last.kind, ErrorKind::Transport);
        assert!(last.message.contains("bad id"));
        assert!(last.to_string().contains("transport"));
    }

    #[test]
    fn test_display_messages() {
        let err = TrackingError::invalid_identifier("must not be empty");
        assert!(err.to_string().contains("must not be empty"));

        let err = TrackingError::from(SourceError::timeout(Duration::from_secs(10)));
        assert!(err.to_string().contains("source error"));
    }
}
