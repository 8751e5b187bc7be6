//! Offline queue of chat requests submitted while disconnected.

use std::collections::VecDeque;

/// 送信待ちのチャット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingChat {
    /// ローカルエコーを記録する会話の相手
    pub contact_id: String,
    pub content: String,
}

impl OutgoingChat {
    pub fn new(contact_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            content: content.into(),
        }
    }
}

/// 送信順を保つオフラインキュー
///
/// プロセスが生きている間、積まれたメッセージが破棄されることはない。
#[derive(Debug, Default)]
pub struct OfflineQueue {
    items: VecDeque<OutgoingChat>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 末尾に追加し、追加後の件数を返す
    pub fn enqueue(&mut self, chat: OutgoingChat) -> usize {
        self.items.push_back(chat);
        self.items.len()
    }

    pub fn pop_front(&mut self) -> Option<OutgoingChat> {
        self.items.pop_front()
    }

    /// 送信に失敗したメッセージを先頭に戻す
    pub fn requeue_front(&mut self, chat: OutgoingChat) {
        self.items.push_front(chat);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
