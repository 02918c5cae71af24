//! Value objects for the presence relay.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a user name, in characters
pub const MAX_USER_NAME_CHARS: usize = 32;

/// Maximum size of message content, in bytes
pub const MAX_CONTENT_BYTES: usize = 256;

/// Name used as `sender` on server-originated envelopes; users cannot take it
pub const RESERVED_USER_NAME: &str = "server";

/// Unique, case-sensitive user name.
///
/// Immutable once a session is registered under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::UserNameEmpty);
        }

        let chars = value.chars().count();
        if chars > MAX_USER_NAME_CHARS {
            return Err(ValueObjectError::UserNameTooLong {
                max: MAX_USER_NAME_CHARS,
                actual: chars,
            });
        }

        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValueObjectError::UserNameInvalidCharacter);
        }

        if value == RESERVED_USER_NAME {
            return Err(ValueObjectError::UserNameReserved(value));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text content of a broadcast or private message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::ContentEmpty);
        }
        if value.len() > MAX_CONTENT_BYTES {
            return Err(ValueObjectError::ContentTooLong {
                max: MAX_CONTENT_BYTES,
                actual: value.len(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Presence status of a session.
///
/// Rendered on the wire with the canonical literals `ACTIVE`, `BUSY` and `INACTIVE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    Active,
    Busy,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Busy => "BUSY",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for UserStatus {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "BUSY" => Ok(Self::Busy),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(ValueObjectError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle of one transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
