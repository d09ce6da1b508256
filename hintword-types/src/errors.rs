use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coarse classification of a [`LobbyError`], relayed to clients next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Conflict,
    NotFound,
    Unsupported,
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
#[serde(tag = "kind", content = "message")]
pub enum LobbyError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// A record that construction guarantees to exist is missing.
    /// Never recoverable at the action boundary.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl LobbyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LobbyError::Validation(_) => ErrorKind::Validation,
            LobbyError::Unauthorized(_) => ErrorKind::Unauthorized,
            LobbyError::Conflict(_) => ErrorKind::Conflict,
            LobbyError::NotFound(_) => ErrorKind::NotFound,
            LobbyError::Unsupported(_) => ErrorKind::Unsupported,
            LobbyError::Invariant(_) => ErrorKind::Invariant,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LobbyError::Validation(m)
            | LobbyError::Unauthorized(m)
            | LobbyError::Conflict(m)
            | LobbyError::NotFound(m)
            | LobbyError::Unsupported(m)
            | LobbyError::Invariant(m) => m,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LobbyError::Invariant(_))
    }
}

pub type LobbyResult<T> = Result<T, LobbyError>;
