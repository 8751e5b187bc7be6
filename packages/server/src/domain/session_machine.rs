//! 接続ごとのセッション状態機械
//!
//! ```text
//! Connecting --Admitted--> Active --ChatReceived/MalformedReceived--> Active
//!     |                      |
//!     +--Refused/Closed--> Closed <--TransportClosed--+
//! ```
//!
//! 状態機械は副作用を持たず、入力に対して実行すべき [`SessionAction`] を返します。
//! 実際の送信や登録解除は UI 層のハンドラがユースケースを通して行います。

use super::value_object::MessageContent;

/// セッションのライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Active,
    Closed,
}

/// 状態機械への入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// ハンドシェイクと Identity の割り当てが完了した
    Admitted,
    /// Identity プールの枯渇などで受け入れを拒否された
    Refused,
    /// 正しい形式のチャットペイロードを受信した
    ChatReceived(MessageContent),
    /// 解析できない、または未知の `type` のペイロードを受信した
    MalformedReceived(String),
    /// トランスポートが閉じた（正常終了・エラーを問わない）
    TransportClosed,
}

/// 入力に対して実行すべき処理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// 何もしない
    None,
    /// 送信者を除く全セッションへチャットをブロードキャストする
    BroadcastChat(MessageContent),
    /// ログに残して破棄する
    Ignore(String),
    /// ハンドシェイク完了イベントを送らずに接続を閉じる
    Close,
    /// レジストリから削除し、新しいロスターを残りのセッションへ通知する
    Teardown,
}

/// セッション状態機械
#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Connecting,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// 入力を適用し、実行すべき処理を返す
    pub fn handle(&mut self, input: SessionInput) -> SessionAction {
        use SessionInput as I;
        use SessionPhase as P;

        match (self.phase, input) {
            (P::Connecting, I::Admitted) => {
                self.phase = P::Active;
                SessionAction::None
            }
            (P::Connecting, I::Refused) => {
                self.phase = P::Closed;
                SessionAction::Close
            }
            // ハンドシェイク前の切断: レジストリには何も残っていない
            (P::Connecting, I::TransportClosed) => {
                self.phase = P::Closed;
                SessionAction::None
            }
            (P::Connecting, I::ChatReceived(_) | I::MalformedReceived(_)) => {
                SessionAction::Ignore("payload received before handshake completed".to_string())
            }

            (P::Active, I::ChatReceived(content)) => SessionAction::BroadcastChat(content),
            (P::Active, I::MalformedReceived(reason)) => SessionAction::Ignore(reason),
            (P::Active, I::TransportClosed) => {
                self.phase = P::Closed;
                SessionAction::Teardown
            }
            (P::Active, I::Admitted | I::Refused) => {
                SessionAction::Ignore("session is already active".to_string())
            }

            (P::Closed, _) => SessionAction::None,
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}
