//! InMemory Connection Repository 実装
//!
//! ドメイン層が定義する ConnectionRepository trait の具体的な実装。
//! `ConnectionRegistry` 集約を 1 つの Mutex で保護し、Identity の割り当て・返却と
//! セッションの追加・削除・スナップショットを直列化します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionRegistry, ConnectionRepository, RepositoryError, Session, Timestamp,
};

/// インメモリ Connection Repository 実装
pub struct InMemoryConnectionRepository {
    registry: Arc<Mutex<ConnectionRegistry>>,
}

impl InMemoryConnectionRepository {
    /// 新しい InMemoryConnectionRepository を作成
    pub fn new(registry: Arc<Mutex<ConnectionRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn admit(
        &self,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<Session, RepositoryError> {
        let mut registry = self.registry.lock().await;
        let session = registry.admit(connection_id, connected_at)?;
        tracing::debug!(
            "Admitted connection '{}' as '{}' ({}/{})",
            session.connection_id,
            session.identity.id,
            registry.len(),
            registry.capacity()
        );
        Ok(session)
    }

    async fn remove(&self, connection_id: &ConnectionId) -> Option<Session> {
        let mut registry = self.registry.lock().await;
        let removed = registry.remove(connection_id);
        if let Some(session) = &removed {
            tracing::debug!(
                "Removed connection '{}' and released '{}'",
                connection_id,
                session.identity.id
            );
        }
        removed
    }

    async fn find(&self, connection_id: &ConnectionId) -> Option<Session> {
        let registry = self.registry.lock().await;
        registry.find(connection_id).cloned()
    }

    async fn snapshot(&self) -> Vec<Session> {
        let registry = self.registry.lock().await;
        registry.snapshot()
    }

    async fn count(&self) -> usize {
        let registry = self.registry.lock().await;
        registry.len()
    }

    async fn capacity(&self) -> usize {
        let registry = self.registry.lock().await;
        registry.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionIdFactory, IdentityPool};
    use std::collections::HashSet;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryConnectionRepository の admit / remove / find / snapshot / count
    // - 並行した admit でも Identity が重複しないこと
    //
    // 【なぜこのテストが必要か】
    // - Repository は Identity 割り当ての直列化ポイントそのもの
    // - 並行接続での二重割り当ては致命的な不整合になる
    // ========================================

    fn create_test_repository(pool_size: usize) -> Arc<InMemoryConnectionRepository> {
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new(
            IdentityPool::with_size(pool_size),
        )));
        Arc::new(InMemoryConnectionRepository::new(registry))
    }

    #[tokio::test]
    async fn test_admit_and_find() {
        // テスト項目: 登録したセッションを接続ハンドルで取得できる
        // given (前提条件):
        let repo = create_test_repository(3);
        let id = ConnectionIdFactory::generate();

        // when (操作):
        let session = repo.admit(id.clone(), Timestamp::new(1000)).await.unwrap();

        // then (期待する結果):
        assert_eq!(session.identity.id.as_str(), "user1");
        assert_eq!(repo.find(&id).await, Some(session));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_admit_pool_exhausted() {
        // テスト項目: プール枯渇時は PoolExhausted が返される
        // given (前提条件):
        let repo = create_test_repository(1);
        repo.admit(ConnectionIdFactory::generate(), Timestamp::new(1000))
            .await
            .unwrap();

        // when (操作):
        let result = repo
            .admit(ConnectionIdFactory::generate(), Timestamp::new(2000))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::PoolExhausted));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_nonexistent_connection() {
        // テスト項目: 存在しない接続の削除は None を返す（冪等性）
        // given (前提条件):
        let repo = create_test_repository(3);

        // when (操作):
        let result = repo.remove(&ConnectionIdFactory::generate()).await;

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_remove_then_snapshot() {
        // テスト項目: 削除したセッションはスナップショットに含まれない
        // given (前提条件):
        let repo = create_test_repository(3);
        let a = ConnectionIdFactory::generate();
        let b = ConnectionIdFactory::generate();
        repo.admit(a.clone(), Timestamp::new(1000)).await.unwrap();
        repo.admit(b.clone(), Timestamp::new(2000)).await.unwrap();

        // when (操作):
        let removed = repo.remove(&a).await;
        let snapshot = repo.snapshot().await;

        // then (期待する結果):
        assert!(removed.is_some());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].connection_id, b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admits_assign_distinct_identities() {
        // テスト項目: 並行した admit でもプール内の異なる Identity が割り当てられる
        // given (前提条件):
        let pool_size = 16;
        let repo = create_test_repository(pool_size);

        // when (操作):
        let handles: Vec<_> = (0..pool_size)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.admit(ConnectionIdFactory::generate(), Timestamp::new(i as i64))
                        .await
                })
            })
            .collect();
        let mut ids = HashSet::new();
        for handle in handles {
            let session = handle.await.unwrap().unwrap();
            ids.insert(session.identity.id.as_str().to_string());
        }

        // then (期待する結果):
        assert_eq!(ids.len(), pool_size);
        assert_eq!(repo.count().await, pool_size);
    }
}
