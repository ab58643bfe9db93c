//! Errors raised by the location store transport.

use thiserror::Error;

/// Failure modes of the location store.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The store could not be reached at all.
    #[error("location store unreachable: {0}")]
    Unreachable(String),

    /// The store was reached but refused the request.
    #[error("location store rejected the request: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Create an unreachable error.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    /// Create a rejected error.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}
