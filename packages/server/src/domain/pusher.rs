//! MessagePusher trait 定義
//!
//! クライアントへのフレーム送信（トランスポート層の `send(handle, frame)`）を抽象化します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// 接続ごとの送信チャンネル
///
/// 各接続の writer タスクがこのチャンネルを読み出し、WebSocket に書き込みます。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// UseCase 層はこの trait に依存し、WebSocket などの具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録（WebSocket 接続確立時）
    async fn register_connection(&self, connection: ConnectionId, sender: PusherChannel);

    /// 接続の登録を解除（WebSocket 切断時）
    async fn unregister_connection(&self, connection: &ConnectionId);

    /// 特定の接続にシリアライズ済みフレームを送信
    async fn push_to(&self, connection: &ConnectionId, frame: &str)
    -> Result<(), MessagePushError>;
}
