//! Server state shared by the handlers.

use std::{sync::Arc, time::Duration};

use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, ListSessionsUseCase, SendChatUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（セッション接続のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// ListSessionsUseCase（セッション一覧取得のユースケース）
    pub list_sessions_usecase: Arc<ListSessionsUseCase>,
    /// 接続ごとの送信キューの容量
    pub outbound_buffer: usize,
    /// ソケットへの 1 回の書き込みのタイムアウト
    pub write_timeout: Duration,
}
