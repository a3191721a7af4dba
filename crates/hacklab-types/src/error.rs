//! Error types for the hacklab shell engine.

use serde::{Deserialize, Serialize};

/// Structured error category reported alongside the user-facing message.
///
/// Serialized over the HTTP boundary so the lab UI can react
/// programmatically (e.g. highlight an unknown command) without parsing
/// shell phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSegment,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    UnknownCommand,
    InvalidArguments,
    /// Engine-boundary failures (session bookkeeping, scenario parsing).
    /// Never produced by a shell command itself.
    Internal,
}

/// Errors produced by the hacklab engine.
///
/// Every variant is recoverable and local to a single command invocation;
/// none of them terminate a session.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid name: {0}")]
    InvalidSegment(String),

    #[error("{0}: No such file or directory")]
    NotFound(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: File exists")]
    AlreadyExists(String),

    #[error("{0}: command not found")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("scenario error: {0}")]
    Scenario(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// The wire-facing category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::InvalidSegment(_) => ErrorKind::InvalidSegment,
            SimError::NotFound(_) => ErrorKind::NotFound,
            SimError::NotADirectory(_) => ErrorKind::NotADirectory,
            SimError::IsADirectory(_) => ErrorKind::IsADirectory,
            SimError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            SimError::UnknownCommand(_) => ErrorKind::UnknownCommand,
            SimError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            SimError::Session(_)
            | SimError::Scenario(_)
            | SimError::TomlParse(_)
            | SimError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SimError>;
