//! UseCase: イベント配信エンジン
//!
//! ## 責務
//!
//! - レジストリのスナップショットに対する配信（送信者の除外付き）
//! - 受信者ごとに自分を除いたロスターの通知
//!
//! 配信は [`Turn`] を保持した状態で行います。これにより、同じ送信者からの
//! イベントは各受信者に送信順で届き、ロスターは常に最新のレジストリを反映します。
//! 個別の送信失敗はバッチを中断しません。失敗した接続は送信キューが閉じられ、
//! 通常の切断経路で片付けられます。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRepository, MessagePusher, roster_excluding},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    error::BroadcastError,
    sequencer::{Sequencer, Turn},
};

/// 1 回の配信の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 送信キューに積めた接続数
    pub delivered: usize,
    /// 送信できず切り離された接続
    pub dropped: Vec<ConnectionId>,
}

/// イベント配信エンジン
pub struct BroadcastEngine {
    sequencer: Sequencer,
    repository: Arc<dyn ConnectionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastEngine {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            sequencer: Sequencer::new(),
            repository,
            message_pusher,
        }
    }

    /// 配信の順番を取得
    pub async fn turn(&self) -> Turn<'_> {
        self.sequencer.turn().await
    }

    /// スナップショット中の `exclude` 以外の全セッションへイベントを送る
    ///
    /// # Arguments
    ///
    /// * `_turn` - 配信の順番（保持していることの証明）
    /// * `event` - 配信するイベント
    /// * `exclude` - 配信対象から外す接続（送信者）
    pub async fn broadcast(
        &self,
        _turn: &Turn<'_>,
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> Result<BroadcastReport, BroadcastError> {
        let json = event.to_json()?;

        let targets: Vec<ConnectionId> = self
            .repository
            .snapshot()
            .await
            .into_iter()
            .map(|session| session.connection_id)
            .filter(|id| Some(id) != exclude)
            .collect();
        let attempted = targets.len();

        let dropped = self.message_pusher.broadcast(targets, &json).await;

        Ok(BroadcastReport {
            delivered: attempted.saturating_sub(dropped.len()),
            dropped,
        })
    }

    /// 全セッションへ、それぞれ自分を除いたロスターを送る
    pub async fn announce_roster(&self, _turn: &Turn<'_>) -> Result<BroadcastReport, BroadcastError> {
        let sessions = self.repository.snapshot().await;
        let mut report = BroadcastReport::default();

        for session in &sessions {
            let roster = roster_excluding(&sessions, &session.connection_id);
            let json = ServerEvent::roster(&roster).to_json()?;

            match self
                .message_pusher
                .push_to(&session.connection_id, &json)
                .await
            {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("Failed to push roster: {}", e);
                    report.dropped.push(session.connection_id.clone());
                }
            }
        }

        tracing::debug!(
            "Announced roster to {} session(s) ({} dropped)",
            report.delivered,
            report.dropped.len()
        );

        Ok(report)
    }
}
