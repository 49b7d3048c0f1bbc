//! Backend traits and types

use crate::results::{Candidate, FailureKind};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single backend search call
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend call timed out")]
    Timeout,
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Category reported to callers
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable(_) => FailureKind::BackendUnavailable,
            Self::Timeout => FailureKind::BackendTimeout,
            Self::Malformed(_) => FailureKind::MalformedBackendResponse,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

/// Nearest-neighbor search capability queried once per input text
///
/// Calls must be safe to issue concurrently from many tasks; they are
/// idempotent and have no side effects on the backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name, used in logs and the health endpoint
    fn name(&self) -> &str;

    /// Return at most `limit` candidates for `query`, best match first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BackendError::Unavailable("refused".into()).kind(),
            FailureKind::BackendUnavailable
        );
        assert_eq!(BackendError::Timeout.kind(), FailureKind::BackendTimeout);
        assert_eq!(
            BackendError::Malformed("no data".into()).kind(),
            FailureKind::MalformedBackendResponse
        );
    }

    #[test]
    fn test_error_messages() {
        let err = BackendError::Malformed("missing Get".into());
        assert_eq!(err.to_string(), "malformed backend response: missing Get");
    }
}
