//! ドメイン層
//!
//! リレーの中核となるモデルとルールを定義します。
//!
//! - `value_object`: 接続 ID・ユーザー ID などの値オブジェクト
//! - `entity`: Identity / Session / ChatMessage
//! - `identity_pool`: 固定長の Identity プール（フリーリスト）
//! - `registry`: 接続レジストリ集約（プール + 接続中セッション）
//! - `session_machine`: 接続ごとのライフサイクル状態機械
//! - `repository` / `message_pusher`: Infrastructure 層が実装する trait

pub mod entity;
pub mod error;
pub mod identity_pool;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod session_machine;
pub mod value_object;

pub use entity::{ChatMessage, Identity, Session};
pub use error::{DomainError, MessagePushError, RepositoryError, ValueObjectError};
pub use identity_pool::IdentityPool;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::{ConnectionRegistry, roster_excluding};
pub use repository::ConnectionRepository;
pub use session_machine::{SessionAction, SessionInput, SessionMachine, SessionPhase};
pub use value_object::{
    ConnectionId, ConnectionIdFactory, DisplayName, MessageContent, Timestamp, UserId,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
