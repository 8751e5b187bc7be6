//! メッセージ送信（通知）の trait 定義
//!
//! ## 概要
//!
//! UseCase 層はこの trait を通してクライアントへメッセージを送ります。
//! 各接続の送信キューは容量付きで、送信は決してブロックしません。
//! キューが満杯、または閉じている接続への送信は失敗として報告されます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// 接続ごとの送信キュー（シリアライズ済みの JSON 文字列）
pub type PusherChannel = mpsc::Sender<String>;

/// MessagePusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信キューを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信キューを登録解除
    ///
    /// 送信キューが破棄されるため、対応する接続の送信タスクは終了し、接続は閉じられる。
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続へ送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続へ同じ内容を送信
    ///
    /// 一部の送信失敗で中断せず、送信できなかった接続の一覧を返す。
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Vec<ConnectionId>;
}
