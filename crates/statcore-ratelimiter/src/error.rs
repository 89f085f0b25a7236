use std::fmt;

/// Errors the limiter itself can raise. Distinct from `statcore_core::CoreError`
/// so this crate stays usable standalone; callers map it at the boundary
/// (§4.2/§7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Admission could not be granted within the configured bound.
    TemporarilyUnavailable,
    /// The caller's cancellation token fired while waiting for admission.
    Cancelled,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::TemporarilyUnavailable => {
                write!(f, "rate limit admission refused within bound")
            }
            RateLimitError::Cancelled => write!(f, "cancelled while waiting for admission"),
        }
    }
}

impl std::error::Error for RateLimitError {}

impl From<RateLimitError> for statcore_core::CoreError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::TemporarilyUnavailable => {
                statcore_core::CoreError::TemporarilyUnavailable
            }
            RateLimitError::Cancelled => statcore_core::CoreError::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            RateLimitError::TemporarilyUnavailable.to_string(),
            "rate limit admission refused within bound"
        );
    }
}
