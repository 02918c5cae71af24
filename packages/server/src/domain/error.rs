//! Domain error types.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Value object validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("user name must not be empty")]
    UserNameEmpty,

    #[error("user name must be at most {max} characters (got {actual})")]
    UserNameTooLong { max: usize, actual: usize },

    #[error("user name must not contain whitespace or control characters")]
    UserNameInvalidCharacter,

    #[error("user name '{0}' is reserved")]
    UserNameReserved(String),

    #[error("content must not be empty")]
    ContentEmpty,

    #[error("content must be at most {max} bytes (got {actual})")]
    ContentTooLong { max: usize, actual: usize },

    #[error("unknown status '{0}' (expected ACTIVE, BUSY or INACTIVE)")]
    UnknownStatus(String),
}

/// Session registry errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("user name '{0}' is already taken")]
    DuplicateName(String),

    #[error("server is full ({0} sessions)")]
    CapacityExceeded(usize),

    #[error("connection is already bound to session '{0}'")]
    ConnectionAlreadyBound(String),
}

/// Message push errors (transport-level send failures)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
