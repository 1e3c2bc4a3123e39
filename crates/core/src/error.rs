//! Unified error types for the coinstash offline worker.
//!
//! Display strings carry stable `CODE: detail` prefixes so log lines and
//! foreground collaborators can match on the failure class without parsing
//! prose.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the cache store and the worker runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be encoded or decoded.
    #[error("CACHE_ERROR: {0}")]
    Encoding(String),

    /// Invalid request URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network transport failure (connectivity loss, timeout, DNS).
    ///
    /// HTTP error statuses are not transport failures; they come back as
    /// ordinary responses.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A precache fetch failed during install; the install attempt is dead.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// A lifecycle transition was requested from the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
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
