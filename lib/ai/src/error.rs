//! Error types for the completion boundary.

use std::fmt;

/// Errors from completion backend operations.
///
/// These cover the ways an external completion provider can fail. The
/// workflow engine treats every variant the same way: it falls back to a
/// local heuristic and keeps the run alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Provider is unavailable (network, DNS, connection refused).
    ProviderUnavailable { provider: String, reason: String },
    /// Request was rejected (bad auth, malformed payload).
    RequestFailed { status: Option<u16>, reason: String },
    /// Response body could not be parsed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for a response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Backend was constructed with an invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "completion provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { status, reason } => {
                if let Some(status) = status {
                    write!(f, "completion request failed ({status}): {reason}")
                } else {
                    write!(f, "completion request failed: {reason}")
                }
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse completion response: {reason}")
            }
            Self::Timeout => write!(f, "completion request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid completion configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CompletionError::RequestFailed {
            status: Some(429),
            reason: "quota exhausted".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[test]
    fn rate_limited_display() {
        let err = CompletionError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().contains("30s"));
    }
}
