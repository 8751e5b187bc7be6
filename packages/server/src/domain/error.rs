//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("message content must not be empty")]
    EmptyMessageContent,

    #[error("message content is too long ({len} chars, max {max})")]
    MessageContentTooLong { len: usize, max: usize },
}

/// 接続レジストリ集約のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Identity プールに空きがない
    #[error("identity pool exhausted")]
    PoolExhausted,

    /// 同じ接続ハンドルが既に登録されている
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// Repository のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("identity pool exhausted")]
    PoolExhausted,

    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

impl From<DomainError> for RepositoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::PoolExhausted => Self::PoolExhausted,
            DomainError::DuplicateConnection(id) => Self::DuplicateConnection(id),
        }
    }
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    #[error("outbound channel of connection '{0}' is closed")]
    ChannelClosed(String),

    #[error("outbound buffer of connection '{0}' is full")]
    BufferFull(String),
}
