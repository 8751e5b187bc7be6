//! UseCase: 接続中セッション一覧の取得

use std::sync::Arc;

use crate::domain::{ConnectionRepository, Session};

/// 接続中セッション一覧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListing {
    /// 到着順
    pub sessions: Vec<Session>,
    pub capacity: usize,
}

pub struct ListSessionsUseCase {
    repository: Arc<dyn ConnectionRepository>,
}

impl ListSessionsUseCase {
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> SessionListing {
        SessionListing {
            sessions: self.repository.snapshot().await,
            capacity: self.repository.capacity().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionIdFactory, ConnectionRegistry, IdentityPool, Timestamp},
        infrastructure::repository::InMemoryConnectionRepository,
    };
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_list_sessions_in_arrival_order() {
        // テスト項目: 接続中のセッションが到着順に取得できる
        // given (前提条件):
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new(IdentityPool::with_size(5))));
        let repository = Arc::new(InMemoryConnectionRepository::new(registry));
        let first = repository
            .admit(ConnectionIdFactory::generate(), Timestamp::new(1))
            .await
            .unwrap();
        let second = repository
            .admit(ConnectionIdFactory::generate(), Timestamp::new(2))
            .await
            .unwrap();
        let usecase = ListSessionsUseCase::new(repository);

        // when (操作):
        let listing = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(listing.sessions, vec![first, second]);
        assert_eq!(listing.capacity, 5);
    }
}
