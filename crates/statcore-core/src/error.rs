//! The error taxonomy every statcore crate returns.
//!
//! These are kinds, not types: a database error and a JSON decode error both
//! collapse to `Internal`. Callers branch on the kind, not on the source.

/// Unified error type returned by every public statcore operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity does not exist upstream (and, for usernames, has been
    /// removed from the local repository).
    #[error("not found")]
    NotFound,
    /// Upstream returned 429/5xx, or rate-limit admission was refused.
    /// Callers should retry.
    #[error("temporarily unavailable")]
    TemporarilyUnavailable,
    /// The request itself is malformed: an un-normalized uuid, an empty
    /// username, a bad time range, an out-of-bounds limit.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The tag provider rejected the configured API key.
    #[error("invalid API key")]
    InvalidApiKey,
    /// The caller's `CancellationToken` fired before the operation completed.
    #[error("operation cancelled")]
    Cancelled,
    /// Database, JSON, or I/O failure. Always reported via [`crate::ErrorReporter`]
    /// before propagating.
    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl CoreError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        CoreError::Internal(err.into())
    }

    /// Whether this error kind is reported to telemetry (§7: NotFound,
    /// TemporarilyUnavailable, and Cancelled are surfaced verbatim and never
    /// reported).
    pub fn should_report(&self) -> bool {
        !matches!(
            self,
            CoreError::NotFound | CoreError::TemporarilyUnavailable | CoreError::Cancelled
        )
    }
}

/// Adapts `anyhow::Error` (the common currency for database/JSON failures)
/// into the `Internal` variant.
impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_reported() {
        assert!(!CoreError::NotFound.should_report());
        assert!(!CoreError::TemporarilyUnavailable.should_report());
        assert!(!CoreError::Cancelled.should_report());
    }

    #[test]
    fn invalid_input_and_internal_are_reported() {
        assert!(CoreError::invalid_input("bad uuid").should_report());
        assert!(CoreError::internal(anyhow::anyhow!("boom")).should_report());
        assert!(CoreError::InvalidApiKey.should_report());
    }

    #[test]
    fn display_includes_context() {
        let err = CoreError::invalid_input("limit out of range");
        assert_eq!(err.to_string(), "invalid input: limit out of range");
    }
}
