//! Server state shared by every handler.

use std::sync::Arc;

use crate::{
    domain::{MessagePusher, SessionRegistry},
    usecase::ProtocolDispatcher,
};

/// Shared application state
pub struct AppState {
    /// ProtocolDispatcher（受信フレームの処理）
    pub dispatcher: Arc<ProtocolDispatcher>,
    /// SessionRegistry（HTTP API からの参照用）
    pub registry: Arc<dyn SessionRegistry>,
    /// MessagePusher（接続ごとの送信チャンネルの登録・解除）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// 受信フレームの最大バイト数
    pub max_frame_bytes: usize,
}
