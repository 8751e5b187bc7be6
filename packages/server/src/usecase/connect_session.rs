//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - Identity の割り当て、init の送信、ロスターの通知
//!
//! ### なぜこのテストが必要か
//! - init は新しいセッションへの最初のイベントでなければならない
//! - プール枯渇時はイベントを一切送らずに拒否する必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規セッションの接続
//! - 異常系：プール枯渇

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{
        ConnectionId, ConnectionRepository, MessagePusher, PusherChannel, RepositoryError,
        Session, Timestamp,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::{broadcast::BroadcastEngine, error::ConnectError};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    broadcast_engine: Arc<BroadcastEngine>,
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcast_engine: Arc<BroadcastEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            broadcast_engine,
            clock,
        }
    }

    /// セッション接続を実行
    ///
    /// Identity の割り当て、送信キューの登録、init の送信、ロスターの通知を
    /// 1 つの配信の順番の中で行う。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 接続ハンドル
    /// * `sender` - この接続の送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 接続成功
    /// * `Err(ConnectError)` - 接続失敗（レジストリは変更されず、イベントも送られない）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<Session, ConnectError> {
        let turn = self.broadcast_engine.turn().await;

        // 1. Identity を割り当ててセッションを登録
        let connected_at = Timestamp::new(self.clock.now_millis());
        let session = self
            .repository
            .admit(connection_id.clone(), connected_at)
            .await
            .map_err(|e| match e {
                RepositoryError::PoolExhausted => ConnectError::PoolExhausted,
                RepositoryError::DuplicateConnection(id) => ConnectError::DuplicateConnection(id),
            })?;

        // 2. 送信キューを登録し、init を最初のイベントとして積む
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        let init_result = match ServerEvent::init(&session.identity).to_json() {
            Ok(json) => self
                .message_pusher
                .push_to(&connection_id, &json)
                .await
                .map_err(|e| ConnectError::InitUndeliverable(e.to_string())),
            Err(e) => Err(ConnectError::InitUndeliverable(e.to_string())),
        };
        if let Err(e) = init_result {
            self.message_pusher.unregister_client(&connection_id).await;
            self.repository.remove(&connection_id).await;
            return Err(e);
        }

        // 3. 新しいセッションを含む全員へロスターを通知
        self.broadcast_engine.announce_roster(&turn).await?;

        Ok(session)
    }
}
