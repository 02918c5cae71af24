//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのフレーム送信（push_to）とフレームサイズ上限のチェック
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、フレーム送信に使用します。
//! 各フレームは受信者ごとに独立した `String` として送られるため、
//! 受信者間でバッファが共有されることはありません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new(Arc::new(Mutex::new(HashMap::new())), 4096);
/// pusher.register_connection(connection_id, tx).await;
/// pusher.push_to(&connection_id, "{\"type\":\"server\"}").await?;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
    /// 送信可能なフレームの最大バイト数
    max_frame_bytes: usize,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(
        connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            connections,
            max_frame_bytes,
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection);
    }

    async fn unregister_connection(&self, connection: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection);
        tracing::debug!("Connection '{}' unregistered from MessagePusher", connection);
    }

    async fn push_to(
        &self,
        connection: &ConnectionId,
        frame: &str,
    ) -> Result<(), MessagePushError> {
        if frame.len() > self.max_frame_bytes {
            return Err(MessagePushError::FrameTooLarge {
                size: frame.len(),
                limit: self.max_frame_bytes,
            });
        }

        let connections = self.connections.lock().await;
        let sender = connections
            .get(connection)
            .ok_or(MessagePushError::ConnectionNotFound(*connection))?;

        sender
            .send(frame.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed frame to connection '{}'", connection);
        Ok(())
    }
}
