//! Error types for travelmapp-core

use thiserror::Error;

/// Result type alias using travelmapp-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Name used by callers that only deal with the place access layer.
pub type AccessError = Error;

/// Errors that can occur in travelmapp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No signed-in user for an operation that requires one
    #[error("User not logged in")]
    Unauthenticated,

    /// Referenced document does not exist
    #[error("Place not found: {0}")]
    NotFound(String),

    /// Signed-in user does not own the record
    #[error("{0}")]
    Forbidden(String),

    /// Stored document cannot be decoded into a place
    #[error("Unable to parse place data: {0}")]
    MalformedRecord(String),

    /// The remote service answered with a failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The request never completed (network, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Machine-checkable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    Forbidden,
    MalformedRecord,
    StoreUnavailable,
    Transport,
    InvalidInput,
    Serialization,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::MalformedRecord(_) => ErrorKind::MalformedRecord,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether retrying the same call later could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}
