//! UseCase 層のエラー型

use thiserror::Error;

/// イベントの配信エラー
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// セッション接続のエラー
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Identity プールに空きがない
    #[error("identity pool exhausted")]
    PoolExhausted,

    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    /// init イベントを送信キューに積めなかった
    #[error("failed to deliver init event: {0}")]
    InitUndeliverable(String),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// チャット送信のエラー
#[derive(Debug, Error)]
pub enum SendChatError {
    /// 送信元のセッションが既に存在しない
    #[error("session for connection '{0}' not found")]
    UnknownSession(String),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}
