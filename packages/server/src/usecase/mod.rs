//! UseCase 層
//!
//! - `connect_session` / `disconnect_session`: セッションのライフサイクル
//! - `send_chat`: チャットの中継
//! - `list_sessions`: 接続中セッションの参照（HTTP API 用）
//! - `broadcast` / `sequencer`: 配信エンジンとその直列化ポイント

pub mod broadcast;
pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod list_sessions;
pub mod send_chat;
pub mod sequencer;

pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{BroadcastError, ConnectError, SendChatError};
pub use list_sessions::{ListSessionsUseCase, SessionListing};
pub use send_chat::SendChatUseCase;
pub use sequencer::{Sequencer, Turn};
