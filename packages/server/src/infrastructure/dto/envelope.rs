//! WebSocket message envelope.
//!
//! One envelope shape is shared by both directions. Only `type` is always present;
//! the remaining fields are omitted from the JSON when absent.

use serde::{Deserialize, Serialize};

use crate::domain::UserStatus;

/// `sender` value on every envelope the server originates itself
pub const SERVER_SENDER: &str = "server";

/// Content of an `user_info_response` for a target that is not registered
pub const USER_NOT_FOUND: &str = "not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // client -> server
    Register,
    ListUsers,
    UserInfo,
    ChangeStatus,
    Disconnect,
    // both directions
    Broadcast,
    Private,
    // server -> client
    RegisterSuccess,
    ListUsersResponse,
    UserInfoResponse,
    StatusUpdate,
    UserDisconnected,
    Server,
    Error,
}

impl MessageType {
    pub const ALL: [MessageType; 14] = [
        Self::Register,
        Self::ListUsers,
        Self::UserInfo,
        Self::ChangeStatus,
        Self::Disconnect,
        Self::Broadcast,
        Self::Private,
        Self::RegisterSuccess,
        Self::ListUsersResponse,
        Self::UserInfoResponse,
        Self::StatusUpdate,
        Self::UserDisconnected,
        Self::Server,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::ListUsers => "list_users",
            Self::UserInfo => "user_info",
            Self::ChangeStatus => "change_status",
            Self::Disconnect => "disconnect",
            Self::Broadcast => "broadcast",
            Self::Private => "private",
            Self::RegisterSuccess => "register_success",
            Self::ListUsersResponse => "list_users_response",
            Self::UserInfoResponse => "user_info_response",
            Self::StatusUpdate => "status_update",
            Self::UserDisconnected => "user_disconnected",
            Self::Server => "server",
            Self::Error => "error",
        }
    }

    pub fn from_literal(literal: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == literal)
    }

    /// Whether clients may send this type to the server
    pub fn is_client_request(&self) -> bool {
        match self {
            Self::Register
            | Self::ListUsers
            | Self::UserInfo
            | Self::ChangeStatus
            | Self::Disconnect
            | Self::Broadcast
            | Self::Private => true,
            Self::RegisterSuccess
            | Self::ListUsersResponse
            | Self::UserInfoResponse
            | Self::StatusUpdate
            | Self::UserDisconnected
            | Self::Server
            | Self::Error => false,
        }
    }
}

/// Polymorphic envelope payload.
///
/// Variant order matters for decoding: objects with both `ip` and `status` must be
/// tried before the `ip`-only registration shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Names(Vec<String>),
    UserInfo { ip: String, status: UserStatus },
    StatusUpdate { user: String, status: UserStatus },
    Registration { ip: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub r#type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Envelope {
    fn from_server(r#type: MessageType, content: Content, timestamp: String) -> Self {
        Self {
            r#type,
            sender: Some(SERVER_SENDER.to_string()),
            target: None,
            content: Some(content),
            timestamp: Some(timestamp),
        }
    }

    /// Greeting sent as soon as a connection is established
    pub fn server_notice(text: impl Into<String>, timestamp: String) -> Self {
        Self::from_server(MessageType::Server, Content::Text(text.into()), timestamp)
    }

    pub fn register_success(names: Vec<String>, timestamp: String) -> Self {
        Self::from_server(MessageType::RegisterSuccess, Content::Names(names), timestamp)
    }

    pub fn list_users_response(names: Vec<String>, timestamp: String) -> Self {
        Self::from_server(
            MessageType::ListUsersResponse,
            Content::Names(names),
            timestamp,
        )
    }

    /// `content` is either [`Content::UserInfo`] or the [`USER_NOT_FOUND`] marker
    pub fn user_info_response(target: String, content: Content, timestamp: String) -> Self {
        Self {
            target: Some(target),
            ..Self::from_server(MessageType::UserInfoResponse, content, timestamp)
        }
    }

    pub fn status_update(user: String, status: UserStatus, timestamp: String) -> Self {
        Self::from_server(
            MessageType::StatusUpdate,
            Content::StatusUpdate { user, status },
            timestamp,
        )
    }

    pub fn user_disconnected(user: String, timestamp: String) -> Self {
        Self::from_server(MessageType::UserDisconnected, Content::Text(user), timestamp)
    }

    pub fn error(description: impl Into<String>, timestamp: String) -> Self {
        Self::from_server(
            MessageType::Error,
            Content::Text(description.into()),
            timestamp,
        )
    }

    pub fn broadcast(sender: String, content: String, timestamp: String) -> Self {
        Self {
            r#type: MessageType::Broadcast,
            sender: Some(sender),
            target: None,
            content: Some(Content::Text(content)),
            timestamp: Some(timestamp),
        }
    }

    pub fn private(sender: String, target: String, content: String, timestamp: String) -> Self {
        Self {
            r#type: MessageType::Private,
            sender: Some(sender),
            target: Some(target),
            content: Some(Content::Text(content)),
            timestamp: Some(timestamp),
        }
    }

    /// The content if it is a plain string
    pub fn content_text(&self) -> Option<&str> {
        match &self.content {
            Some(Content::Text(text)) => Some(text),
            _ => None,
        }
    }
}
