//! Infrastructure 層
//!
//! - `dto`: ワイヤーフォーマット（WebSocket / HTTP）
//! - `message_pusher`: `MessagePusher` trait の実装
//! - `repository`: `ConnectionRepository` trait の実装

pub mod dto;
pub mod message_pusher;
pub mod repository;
