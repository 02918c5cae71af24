//! UseCase: ブロードキャスト / Fan-out
//!
//! エンベロープを一度だけシリアライズし、Registry から取得した接続のスナップショットに
//! 対して受信者ごとに独立したフレームを送信します。
//! 一部の受信者への送信失敗は他の受信者への配送を妨げません（ログのみ）。
//! 再送やキューイングは行いません。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, SessionRegistry},
    infrastructure::{codec, dto::Envelope},
};

use super::error::FanOutError;

/// 1 回の deliver_to_all の配送結果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fan-out エンジン
pub struct FanOut {
    /// Registry（配送先の取得）
    registry: Arc<dyn SessionRegistry>,
    /// MessagePusher（フレーム送信の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl FanOut {
    /// 新しい FanOut を作成
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// 登録済みの全セッションに配送
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - 配送結果（部分的な失敗を含む）
    /// * `Err(FanOutError::Encode)` - シリアライズ失敗（誰にも送信されない）
    pub async fn deliver_to_all(&self, envelope: &Envelope) -> Result<DeliveryReport, FanOutError> {
        let frame = codec::encode(envelope)?;
        let targets = self.registry.all_handles().await;

        let mut report = DeliveryReport::default();
        for connection in targets {
            match self.message_pusher.push_to(&connection, &frame).await {
                Ok(()) => report.delivered += 1,
                Err(MessagePushError::ConnectionNotFound(_)) => {
                    // 配送中に切断された接続
                    tracing::debug!(
                        "Connection '{}' closed during fan-out, skipping",
                        connection
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to deliver to connection '{}': {}", connection, e);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Fan-out of '{}' delivered to {} connection(s), {} failed",
            envelope.r#type.as_str(),
            report.delivered,
            report.failed
        );
        Ok(report)
    }

    /// 名前で指定した 1 セッションに配送
    ///
    /// 対象が存在しない場合は副作用なしで `TargetNotFound` を返す。
    pub async fn deliver_to_one(&self, target: &str, envelope: &Envelope) -> Result<(), FanOutError> {
        let session = self
            .registry
            .find(target)
            .await
            .ok_or_else(|| FanOutError::TargetNotFound(target.to_string()))?;

        let frame = codec::encode(envelope)?;
        self.message_pusher
            .push_to(&session.connection, &frame)
            .await?;
        Ok(())
    }

    /// 接続に直接返信（未登録の接続も含む）
    pub async fn reply(
        &self,
        connection: &ConnectionId,
        envelope: &Envelope,
    ) -> Result<(), FanOutError> {
        let frame = codec::encode(envelope)?;
        self.message_pusher.push_to(connection, &frame).await?;
        Ok(())
    }
}
