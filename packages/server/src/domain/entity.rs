//! エンティティ

use super::value_object::{ConnectionId, DisplayName, MessageContent, Timestamp, UserId};

/// セッションが他のセッションから識別される `{id, name}` の組
///
/// 一度割り当てられたら変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: UserId,
    pub name: DisplayName,
}

impl Identity {
    pub fn new(id: UserId, name: DisplayName) -> Self {
        Self { id, name }
    }
}

/// 接続ハンドルと割り当て済み Identity の対応
///
/// 接続レジストリだけが所有する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub connected_at: Timestamp,
}

impl Session {
    pub fn new(connection_id: ConnectionId, identity: Identity, connected_at: Timestamp) -> Self {
        Self {
            connection_id,
            identity,
            connected_at,
        }
    }
}

/// 送信時に構築されるチャットメッセージ
///
/// 送信者とタイムスタンプはサーバーが決定する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Identity,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(sender: Identity, content: MessageContent, timestamp: Timestamp) -> Self {
        Self {
            sender,
            content,
            timestamp,
        }
    }
}
