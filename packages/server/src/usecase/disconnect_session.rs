//! UseCase: セッション切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - セッションの削除と、残りのセッションへのロスター通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続中のセッションの切断
//! - エッジケース：既に削除済みの接続の切断（冪等性）

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRepository, MessagePusher, Session};

use super::{broadcast::BroadcastEngine, error::BroadcastError};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    repository: Arc<dyn ConnectionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcast_engine: Arc<BroadcastEngine>,
}

impl DisconnectSessionUseCase {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcast_engine: Arc<BroadcastEngine>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            broadcast_engine,
        }
    }

    /// セッション切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Session))` - 削除したセッション（残りのセッションへロスターを通知済み）
    /// * `Ok(None)` - 未登録の接続（何もしない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<Session>, BroadcastError> {
        let turn = self.broadcast_engine.turn().await;

        self.message_pusher.unregister_client(connection_id).await;
        let Some(session) = self.repository.remove(connection_id).await else {
            return Ok(None);
        };

        self.broadcast_engine.announce_roster(&turn).await?;

        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionIdFactory, ConnectionRegistry, IdentityPool, Timestamp},
        infrastructure::{
            dto::websocket::ServerEvent, message_pusher::WebSocketMessagePusher,
            repository::InMemoryConnectionRepository,
        },
    };
    use tokio::sync::{Mutex, mpsc};

    #[tokio::test]
    async fn test_disconnect_announces_roster_to_remaining_sessions() {
        // テスト項目: 切断後、残りのセッションに新しいロスターが届く
        // given (前提条件):
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new(IdentityPool::reference())));
        let repository = Arc::new(InMemoryConnectionRepository::new(registry));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let engine = Arc::new(BroadcastEngine::new(repository.clone(), pusher.clone()));
        let usecase = DisconnectSessionUseCase::new(repository.clone(), pusher.clone(), engine);

        let alice = repository
            .admit(ConnectionIdFactory::generate(), Timestamp::new(1))
            .await
            .unwrap();
        let bob = repository
            .admit(ConnectionIdFactory::generate(), Timestamp::new(2))
            .await
            .unwrap();
        let (tx_alice, mut rx_alice) = mpsc::channel(4);
        let (tx_bob, mut rx_bob) = mpsc::channel(4);
        pusher.register_client(alice.connection_id.clone(), tx_alice).await;
        pusher.register_client(bob.connection_id.clone(), tx_bob).await;

        // when (操作):
        let removed = usecase.execute(&bob.connection_id).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, Some(bob));
        assert_eq!(
            ServerEvent::parse(&rx_alice.recv().await.unwrap()),
            Some(ServerEvent::roster(&[]))
        );
        // 切断したセッションの送信キューは閉じられる
        assert_eq!(rx_bob.recv().await, None);
        assert_eq!(repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection_is_noop() {
        // テスト項目: 未登録の接続の切断は何もしない（冪等性）
        // given (前提条件):
        let registry = Arc::new(Mutex::new(ConnectionRegistry::default()));
        let repository = Arc::new(InMemoryConnectionRepository::new(registry));
        let mut pusher = crate::domain::MockMessagePusher::new();
        pusher.expect_unregister_client().times(1).returning(|_| ());
        pusher.expect_push_to().never();
        let pusher = Arc::new(pusher);
        let engine = Arc::new(BroadcastEngine::new(repository.clone(), pusher.clone()));
        let usecase = DisconnectSessionUseCase::new(repository, pusher, engine);

        // when (操作):
        let result = usecase.execute(&ConnectionIdFactory::generate()).await;

        // then (期待する結果):
        assert!(matches!(result, Ok(None)));
    }
}
