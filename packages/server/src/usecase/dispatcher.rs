//! UseCase: プロトコルディスパッチャ
//!
//! 受信フレームをデコードし、接続の状態（CONNECTED / REGISTERED / CLOSED）に照らして
//! 検証した上で、メッセージタイプごとのハンドラを呼び出します。
//!
//! 検証は fail-closed です。必須フィールドの欠落や型の不一致は `error` エンベロープで
//! 送信者にのみ通知され、状態変更は一切行われません。

use std::{str::FromStr, sync::Arc};

use tsudoi_shared::time::Clock;

use crate::{
    domain::{ConnectionId, MessageContent, Session, SessionRegistry, UserName, UserStatus},
    infrastructure::{
        codec,
        dto::{Content, Envelope, MessageType, envelope::USER_NOT_FOUND},
    },
};

use super::{
    error::{FanOutError, ProtocolError},
    fan_out::FanOut,
};

/// 接続時に送信する挨拶メッセージ
pub const GREETING: &str = "connection established";

/// 接続ごとの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// 接続済み・未登録
    Connected,
    /// セッションに結び付いている
    Registered(UserName),
    /// disconnect 処理済み
    Closed,
}

/// 1 つのトランスポート接続の情報
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    remote_address: String,
    state: ConnectionState,
}

impl Connection {
    pub fn new(id: ConnectionId, remote_address: String) -> Self {
        Self {
            id,
            remote_address,
            state: ConnectionState::Connected,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }
}

/// プロトコルディスパッチャ
pub struct ProtocolDispatcher {
    /// Registry（セッションの唯一の情報源）
    registry: Arc<dyn SessionRegistry>,
    /// FanOut（配送）
    fan_out: Arc<FanOut>,
    /// タイムスタンプ用の時計
    clock: Arc<dyn Clock>,
}

impl ProtocolDispatcher {
    /// 新しい ProtocolDispatcher を作成
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        fan_out: Arc<FanOut>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            fan_out,
            clock,
        }
    }

    /// 接続直後の挨拶を送信
    pub async fn greet(&self, connection: &Connection) {
        let envelope = Envelope::server_notice(GREETING, self.clock.timestamp());
        self.send_reply(connection.id, &envelope).await;
    }

    /// 受信したテキストフレームを処理
    ///
    /// エラーは `error` エンベロープとして送信者に返され、呼び出し元には伝播しない。
    pub async fn dispatch(&self, connection: &mut Connection, frame: &str) {
        if connection.is_closed() {
            tracing::debug!("Ignoring frame on closed connection '{}'", connection.id);
            return;
        }

        tracing::debug!("Received frame on '{}': {}", connection.id, frame);
        if let Err(e) = self.handle_frame(connection, frame).await {
            tracing::warn!("Rejected message on '{}': {}", connection.id, e);
            self.reply_error(connection.id, &e).await;
        }
    }

    /// バイナリフレームを受信した場合
    pub async fn reject_binary(&self, connection: &Connection) {
        self.reply_error(connection.id, &ProtocolError::BinaryFrame)
            .await;
    }

    /// トランスポートの切断時に呼ばれる
    ///
    /// セッションが残っていれば削除して `user_disconnected` を通知する。
    /// disconnect メッセージで既に削除済みの場合は何もしない（冪等）。
    pub async fn connection_closed(&self, connection: ConnectionId) -> bool {
        match self.registry.remove(&connection).await {
            Some(session) => {
                tracing::info!("User '{}' dropped connection", session.name);
                self.announce_departure(session).await;
                true
            }
            None => false,
        }
    }

    async fn handle_frame(
        &self,
        connection: &mut Connection,
        frame: &str,
    ) -> Result<(), ProtocolError> {
        let envelope = codec::decode(frame)?;

        if envelope.r#type == MessageType::Register {
            return self.handle_register(connection, &envelope).await;
        }
        if !envelope.r#type.is_client_request() {
            return Err(ProtocolError::UnsupportedType(envelope.r#type.as_str()));
        }

        let session = self.authorize(connection, &envelope).await?;
        match envelope.r#type {
            MessageType::Broadcast => self.handle_broadcast(&session, &envelope).await?,
            MessageType::Private => self.handle_private(&session, &envelope).await?,
            MessageType::ListUsers => self.handle_list_users(&session).await,
            MessageType::UserInfo => self.handle_user_info(&session, &envelope).await?,
            MessageType::ChangeStatus => self.handle_change_status(&session, &envelope).await?,
            MessageType::Disconnect => {
                self.handle_disconnect(connection).await;
                return Ok(());
            }
            other => return Err(ProtocolError::UnsupportedType(other.as_str())),
        }

        self.registry.touch(&connection.id).await;
        Ok(())
    }

    /// 登録済みの接続で、sender が接続に結び付いたセッションと一致することを確認
    ///
    /// sender が省略された場合は接続のセッション名を送信者とみなす。
    async fn authorize(
        &self,
        connection: &Connection,
        envelope: &Envelope,
    ) -> Result<Session, ProtocolError> {
        let ConnectionState::Registered(name) = &connection.state else {
            return Err(ProtocolError::NotRegistered);
        };
        if let Some(sender) = envelope.sender.as_deref() {
            if sender != name.as_str() {
                return Err(ProtocolError::NotRegistered);
            }
        }

        match self.registry.find_by_connection(&connection.id).await {
            Some(session) if session.name == *name => Ok(session),
            _ => Err(ProtocolError::NotRegistered),
        }
    }

    async fn handle_register(
        &self,
        connection: &mut Connection,
        envelope: &Envelope,
    ) -> Result<(), ProtocolError> {
        if let ConnectionState::Registered(name) = &connection.state {
            return Err(ProtocolError::AlreadyRegistered(name.to_string()));
        }

        let kind = MessageType::Register.as_str();
        let sender = require_field(kind, "sender", envelope.sender.as_deref())?;
        let name = UserName::new(sender.to_string()).map_err(|e| invalid(kind, e))?;

        let session = self
            .registry
            .register(name.clone(), connection.id, connection.remote_address.clone())
            .await?;
        connection.state = ConnectionState::Registered(name);

        let names = self.registry.snapshot_names().await;
        tracing::info!(
            "User '{}' registered on '{}' ({} online)",
            session.name,
            connection.id,
            names.len()
        );
        let response = Envelope::register_success(names, self.clock.timestamp());
        self.send_reply(connection.id, &response).await;
        Ok(())
    }

    async fn handle_broadcast(
        &self,
        session: &Session,
        envelope: &Envelope,
    ) -> Result<(), ProtocolError> {
        let content = require_content(MessageType::Broadcast, envelope)?;

        tracing::info!("Broadcast from '{}': {}", session.name, content.as_str());
        let outgoing = Envelope::broadcast(
            session.name.to_string(),
            content.into_string(),
            self.clock.timestamp(),
        );
        self.fan_out_to_all(&outgoing).await;
        Ok(())
    }

    async fn handle_private(
        &self,
        session: &Session,
        envelope: &Envelope,
    ) -> Result<(), ProtocolError> {
        let kind = MessageType::Private.as_str();
        let target = require_field(kind, "target", envelope.target.as_deref())?;
        let content = require_content(MessageType::Private, envelope)?;

        let outgoing = Envelope::private(
            session.name.to_string(),
            target.to_string(),
            content.into_string(),
            self.clock.timestamp(),
        );
        match self.fan_out.deliver_to_one(target, &outgoing).await {
            Ok(()) => {
                tracing::info!("Private message from '{}' to '{}'", session.name, target);
                Ok(())
            }
            Err(FanOutError::TargetNotFound(target)) => Err(ProtocolError::TargetNotFound(target)),
            Err(e) => {
                tracing::warn!(
                    "Failed to deliver private message from '{}' to '{}': {}",
                    session.name,
                    target,
                    e
                );
                Ok(())
            }
        }
    }

    async fn handle_list_users(&self, session: &Session) {
        let names = self.registry.snapshot_names().await;
        let response = Envelope::list_users_response(names, self.clock.timestamp());
        self.send_reply(session.connection, &response).await;
    }

    async fn handle_user_info(
        &self,
        session: &Session,
        envelope: &Envelope,
    ) -> Result<(), ProtocolError> {
        let kind = MessageType::UserInfo.as_str();
        let target = require_field(kind, "target", envelope.target.as_deref())?;

        let content = match self.registry.find(target).await {
            Some(found) => Content::UserInfo {
                ip: found.remote_address,
                status: found.status,
            },
            None => Content::Text(USER_NOT_FOUND.to_string()),
        };
        let response =
            Envelope::user_info_response(target.to_string(), content, self.clock.timestamp());
        self.send_reply(session.connection, &response).await;
        Ok(())
    }

    async fn handle_change_status(
        &self,
        session: &Session,
        envelope: &Envelope,
    ) -> Result<(), ProtocolError> {
        let kind = MessageType::ChangeStatus.as_str();
        let literal = envelope
            .content_text()
            .ok_or_else(|| missing(kind, "content"))?;
        let status = UserStatus::from_str(literal).map_err(|e| invalid(kind, e))?;

        if !self.registry.set_status(session.name.as_str(), status).await {
            return Err(ProtocolError::NotRegistered);
        }
        tracing::info!("User '{}' changed status to {}", session.name, status);

        let outgoing =
            Envelope::status_update(session.name.to_string(), status, self.clock.timestamp());
        self.fan_out_to_all(&outgoing).await;
        Ok(())
    }

    async fn handle_disconnect(&self, connection: &mut Connection) {
        connection.state = ConnectionState::Closed;
        if let Some(session) = self.registry.remove(&connection.id).await {
            tracing::info!("User '{}' disconnected", session.name);
            self.announce_departure(session).await;
        }
    }

    async fn announce_departure(&self, session: Session) {
        let envelope =
            Envelope::user_disconnected(session.name.into_string(), self.clock.timestamp());
        self.fan_out_to_all(&envelope).await;
    }

    async fn fan_out_to_all(&self, envelope: &Envelope) {
        if let Err(e) = self.fan_out.deliver_to_all(envelope).await {
            tracing::error!("Failed to fan out '{}': {}", envelope.r#type.as_str(), e);
        }
    }

    async fn reply_error(&self, connection: ConnectionId, error: &ProtocolError) {
        let envelope = Envelope::error(error.to_string(), self.clock.timestamp());
        self.send_reply(connection, &envelope).await;
    }

    async fn send_reply(&self, connection: ConnectionId, envelope: &Envelope) {
        if let Err(e) = self.fan_out.reply(&connection, envelope).await {
            tracing::warn!(
                "Failed to send '{}' to '{}': {}",
                envelope.r#type.as_str(),
                connection,
                e
            );
        }
    }
}

fn missing(kind: &'static str, field: &str) -> ProtocolError {
    ProtocolError::Validation {
        kind,
        reason: format!("'{field}' must be a non-empty string"),
    }
}

fn invalid(kind: &'static str, error: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::Validation {
        kind,
        reason: error.to_string(),
    }
}

fn require_field<'a>(
    kind: &'static str,
    field: &str,
    value: Option<&'a str>,
) -> Result<&'a str, ProtocolError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| missing(kind, field))
}

fn require_content(kind: MessageType, envelope: &Envelope) -> Result<MessageContent, ProtocolError> {
    let text = envelope
        .content_text()
        .ok_or_else(|| missing(kind.as_str(), "content"))?;
    MessageContent::new(text.to_string()).map_err(|e| invalid(kind.as_str(), e))
}
