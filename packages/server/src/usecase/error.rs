//! UseCase 層のエラー型

use thiserror::Error;

use crate::{
    domain::{MessagePushError, RegistryError},
    infrastructure::codec::CodecError,
};

/// 1 つの受信メッセージの処理を中断させるエラー
///
/// `Display` の出力がそのまま `error` エンベロープの content になります。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(#[from] CodecError),

    #[error("invalid '{kind}' message: {reason}")]
    Validation { kind: &'static str, reason: String },

    #[error("user name '{0}' is already taken")]
    DuplicateName(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered as '{0}'")]
    AlreadyRegistered(String),

    #[error("user '{0}' not found")]
    TargetNotFound(String),

    #[error("server is full ({0} sessions)")]
    CapacityExceeded(usize),

    #[error("message type '{0}' cannot be sent by clients")]
    UnsupportedType(&'static str),

    #[error("binary frames are not supported")]
    BinaryFrame,
}

impl From<RegistryError> for ProtocolError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::DuplicateName(name) => Self::DuplicateName(name),
            RegistryError::CapacityExceeded(capacity) => Self::CapacityExceeded(capacity),
            RegistryError::ConnectionAlreadyBound(name) => Self::AlreadyRegistered(name),
        }
    }
}

/// Fan-out のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FanOutError {
    #[error("user '{0}' not found")]
    TargetNotFound(String),

    #[error(transparent)]
    Encode(#[from] CodecError),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}
