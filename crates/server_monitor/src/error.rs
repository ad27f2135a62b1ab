//! Error types for status queries and configuration

use std::io::Error as IoError;
use thiserror::Error;

/// Failures reaching or talking to a remote game server
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No response within {0} seconds")]
    Timeout(u64),

    #[error("Not modified since last request")]
    NotModified,

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Failed to decompress gzip body: {0}")]
    Decompress(IoError),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// A timed out query renders as "down" rather than "unknown"
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// A response that arrived but does not have the expected shape
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Response does not start with '=': {0:?}")]
    MissingPrefix(String),

    #[error("Could not decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Response has no 'error' key: {0}")]
    MissingErrorKey(String),

    #[error("Remote service reported error {0}")]
    RemoteError(String),

    #[error("Unexpected response signature: {0:?}")]
    BadSignature(String),

    #[error("Expected at least {expected} words, got {actual}")]
    TooFewWords { expected: usize, actual: usize },

    #[error("Invalid team count {0:?}")]
    InvalidTeamCount(String),
}

/// Rejected configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot be empty")]
    EmptyTemplate,

    #[error("missing mandatory keyword {{address}}")]
    MissingAddress,

    #[error("Invalid keyword {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Unsupported format spec in {{{0}}}")]
    UnsupportedFormatSpec(String),

    #[error("Malformed template at byte {0}")]
    Malformed(usize),

    #[error("Expecting 'yes' or 'no', got {0:?}")]
    InvalidBoolean(String),
}

/// Everything that can go wrong during a single source update
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Transport(e) if e.is_timeout())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
