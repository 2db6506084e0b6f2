//! Unified error types for the cache router.
//!
//! Every variant displays a stable upper-case code so hosts can map
//! failures without matching on message text.

use tokio_rusqlite::rusqlite;

use crate::lifecycle::Phase;

/// Unified error types for the cache router and its hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a malformed classification rule).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Network request failed before a response arrived.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Network request timed out.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Response body larger than the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Precaching the install manifest failed.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Lifecycle transition not allowed from the current phase.
    #[error("INVALID_TRANSITION: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Network("connection refused".to_string());
        assert!(err.to_string().starts_with("NETWORK_ERROR"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition { from: Phase::Active, to: Phase::Installing };
        assert_eq!(err.to_string(), "INVALID_TRANSITION: active -> installing");
    }
}
