//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（容量付き `mpsc::Sender`）を管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された送信キューを受け取り、メッセージ送信に使用します。
//!
//! 送信は `try_send` で行い、遅いクライアントがブロードキャストを止めることはありません。
//! キューが満杯、または閉じている接続はマップから取り除かれます。送信キューが破棄されると
//! その接続の送信タスクが終了し、通常の切断と同じ経路でセッションが片付けられます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// let (tx, rx) = tokio::sync::mpsc::channel(64);
/// pusher.register_client(connection_id.clone(), tx).await;
///
/// pusher.push_to(&connection_id, "{\"type\":\"chat\",\"content\":\"Hello\"}").await?;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

/// 1 件の送信を試みる
fn try_deliver(
    connection_id: &ConnectionId,
    sender: &PusherChannel,
    content: &str,
) -> Result<(), MessagePushError> {
    sender.try_send(content.to_string()).map_err(|e| match e {
        TrySendError::Full(_) => MessagePushError::BufferFull(connection_id.to_string()),
        TrySendError::Closed(_) => MessagePushError::ChannelClosed(connection_id.to_string()),
    })
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let mut clients = self.clients.lock().await;

        let Some(sender) = clients.get(connection_id) else {
            return Err(MessagePushError::ClientNotFound(connection_id.to_string()));
        };

        match try_deliver(connection_id, sender, content) {
            Ok(()) => {
                tracing::debug!("Pushed message to connection '{}'", connection_id);
                Ok(())
            }
            Err(e) => {
                clients.remove(connection_id);
                Err(e)
            }
        }
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Vec<ConnectionId> {
        let mut clients = self.clients.lock().await;
        let mut failed = Vec::new();

        for target in targets {
            let result = match clients.get(&target) {
                Some(sender) => try_deliver(&target, sender, content),
                None => Err(MessagePushError::ClientNotFound(target.to_string())),
            };

            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = result {
                tracing::warn!("Failed to push message: {}", e);
                clients.remove(&target);
                failed.push(target);
            }
        }

        failed
    }
}
