//! Handler error taxonomy.
//!
//! A handler error never aborts the run: the coordinator converts it into
//! an `error` log entry for the node and the walker moves on, so one
//! misconfigured node cannot take down the whole flow.

use chatflow_integration::{HttpSinkError, NotifyError};

/// Failure of a single node handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The node config could not be deserialized or failed validation.
    InvalidConfig { detail: String },
    /// A required config field is absent or empty.
    MissingField { field: &'static str },
    /// An outbound boundary rejected the call.
    Boundary { detail: String },
}

impl HandlerError {
    #[must_use]
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig { detail } => write!(f, "invalid node config: {detail}"),
            Self::MissingField { field } => write!(f, "missing config field `{field}`"),
            Self::Boundary { detail } => write!(f, "boundary call failed: {detail}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<HttpSinkError> for HandlerError {
    fn from(err: HttpSinkError) -> Self {
        Self::Boundary {
            detail: err.to_string(),
        }
    }
}

impl From<NotifyError> for HandlerError {
    fn from(err: NotifyError) -> Self {
        Self::Boundary {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            HandlerError::missing_field("url").to_string(),
            "missing config field `url`"
        );
        assert_eq!(
            HandlerError::invalid_config("operator `between` unknown").to_string(),
            "invalid node config: operator `between` unknown"
        );
    }
}
