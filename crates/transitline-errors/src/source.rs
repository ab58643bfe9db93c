//! Errors raised by device position sources.

use std::time::Duration;

use thiserror::Error;

/// Failure modes of a position source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The platform refused access to positioning.
    #[error("position access denied: {0}")]
    PermissionDenied(String),

    /// No positioning capability is present or it is switched off.
    #[error("position source unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the allowed wait.
    #[error("timed out waiting for a position fix after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(waited: Duration) -> Self {
        Self::Timeout(waited)
    }

    /// True when the source itself is missing or forbidden, as opposed
    /// to merely slow.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::permission_denied("user dismissed the prompt");
        assert!(err.to_string().contains("denied"));
        assert!(err.to_string().contains("dismissed"));

        let err = SourceError::timeout(Duration::from_secs(10));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_is_unusable() {
        assert!(SourceError::permission_denied("no").is_unusable());
        assert!(SourceError::unavailable("no gps").is_unusable());
        assert!(!SourceError::timeout(Duration::from_secs(1)).is_unusable());
    }
}
