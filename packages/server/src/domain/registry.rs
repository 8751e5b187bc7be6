//! 接続レジストリ集約
//!
//! 接続中のセッション（到着順）と Identity プールをまとめて保持します。
//! Identity の割り当て・返却は必ずセッションの追加・削除と同時に行われるため、
//! この集約を 1 つのロックの内側に置けば割り当ての単射性が保たれます。

use super::{
    entity::{Identity, Session},
    error::DomainError,
    identity_pool::IdentityPool,
    value_object::{ConnectionId, Timestamp},
};

/// 接続ハンドル → Identity の対応を管理する集約
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    pool: IdentityPool,
    /// 到着順のセッション
    sessions: Vec<Session>,
}

impl ConnectionRegistry {
    pub fn new(pool: IdentityPool) -> Self {
        Self {
            pool,
            sessions: Vec::new(),
        }
    }

    /// Identity を割り当ててセッションを登録する
    ///
    /// # Errors
    ///
    /// * `DomainError::DuplicateConnection` - 同じ接続ハンドルが登録済み
    /// * `DomainError::PoolExhausted` - プールに空きがない（レジストリは変更されない）
    pub fn admit(
        &mut self,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<Session, DomainError> {
        if self.contains(&connection_id) {
            return Err(DomainError::DuplicateConnection(connection_id.to_string()));
        }

        let identity = self.pool.assign()?;
        let session = Session::new(connection_id, identity, connected_at);
        self.sessions.push(session.clone());

        Ok(session)
    }

    /// セッションを削除し、Identity をプールに返却する
    ///
    /// 未登録の接続ハンドルの場合は何もせず `None` を返す。
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Session> {
        let index = self
            .sessions
            .iter()
            .position(|session| &session.connection_id == connection_id)?;
        let session = self.sessions.remove(index);
        self.pool.release(&session.identity);

        Some(session)
    }

    pub fn find(&self, connection_id: &ConnectionId) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|session| &session.connection_id == connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.find(connection_id).is_some()
    }

    /// 到着順のセッション一覧のスナップショット
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Identity プールの総数
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }
}

/// `viewer` 自身を除いたロスター（到着順）を作成する
pub fn roster_excluding(sessions: &[Session], viewer: &ConnectionId) -> Vec<Identity> {
    sessions
        .iter()
        .filter(|session| &session.connection_id != viewer)
        .map(|session| session.identity.clone())
        .collect()
}
