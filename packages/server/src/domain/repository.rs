//! Repository trait 定義
//!
//! ドメイン層が必要とする接続レジストリへのアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ConnectionId, RepositoryError, Session, Timestamp};

/// Connection Repository trait
///
/// 実装は全ての変更（admit / remove）とスナップショットを 1 つの
/// 直列化ポイントの内側で行う必要がある。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Identity を割り当ててセッションを登録
    async fn admit(
        &self,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<Session, RepositoryError>;

    /// セッションを削除して Identity を返却（未登録なら `None`）
    async fn remove(&self, connection_id: &ConnectionId) -> Option<Session>;

    /// 接続ハンドルからセッションを取得
    async fn find(&self, connection_id: &ConnectionId) -> Option<Session>;

    /// 到着順のセッション一覧
    async fn snapshot(&self) -> Vec<Session>;

    /// 接続中のセッション数
    async fn count(&self) -> usize;

    /// Identity プールの総数（同時接続数の上限）
    async fn capacity(&self) -> usize;
}
