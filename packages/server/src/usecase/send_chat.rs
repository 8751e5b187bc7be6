//! UseCase: チャット送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatUseCase::execute() メソッド
//! - 送信者情報とタイムスタンプをサーバー側で付与したチャットの配信
//!
//! ### なぜこのテストが必要か
//! - 送信者は自分のチャットを受け取ってはならない
//! - 送信者情報はクライアントの申告ではなくセッションから決まる

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{ChatMessage, ConnectionId, ConnectionRepository, MessageContent, Timestamp},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    broadcast::{BroadcastEngine, BroadcastReport},
    error::SendChatError,
};

/// チャット送信のユースケース
pub struct SendChatUseCase {
    repository: Arc<dyn ConnectionRepository>,
    broadcast_engine: Arc<BroadcastEngine>,
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        broadcast_engine: Arc<BroadcastEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            broadcast_engine,
            clock,
        }
    }

    /// チャット送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続ハンドル
    /// * `content` - メッセージ本文
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - 送信者以外への配信結果
    /// * `Err(SendChatError)` - 送信元のセッションが存在しない場合など
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        content: MessageContent,
    ) -> Result<BroadcastReport, SendChatError> {
        let turn = self.broadcast_engine.turn().await;

        let session = self
            .repository
            .find(connection_id)
            .await
            .ok_or_else(|| SendChatError::UnknownSession(connection_id.to_string()))?;

        let message = ChatMessage::new(
            session.identity,
            content,
            Timestamp::new(self.clock.now_millis()),
        );
        let event = ServerEvent::chat(&message);

        let report = self
            .broadcast_engine
            .broadcast(&turn, &event, Some(connection_id))
            .await?;

        tracing::debug!(
            "Relayed chat from '{}' to {} session(s)",
            message.sender.id,
            report.delivered
        );

        Ok(report)
    }
}
