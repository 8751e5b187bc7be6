//! Integration tests for the relay, driving an in-process server over real sockets.

use std::{collections::HashSet, net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{
    config::RelayConfig,
    infrastructure::dto::{
        http::SessionListDto,
        websocket::{ChatEventDto, ClientCommand, ServerEvent, UserDto},
    },
    ui::Server,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE: Duration = Duration::from_millis(300);

/// Helper struct to manage an in-process relay
struct TestRelay {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestRelay {
    /// Start a relay on an ephemeral port
    async fn start(pool_size: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RelayConfig::new("127.0.0.1", addr.port()).with_pool_size(pool_size);
        let server = Server::from_config(&config);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self) -> Ws {
        let (ws, _) = connect_async(self.ws_url()).await.unwrap();
        ws
    }

    /// Connect and consume `init` and the first roster
    async fn join(&self) -> (Ws, UserDto) {
        let mut ws = self.connect().await;
        let ServerEvent::Init { user } = next_event(&mut ws).await else {
            panic!("first event must be init");
        };
        let ServerEvent::Users { .. } = next_event(&mut ws).await else {
            panic!("second event must be a roster");
        };
        (ws, user)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Wait for the next JSON event, skipping control frames
async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => {
                return ServerEvent::parse(text.as_str())
                    .unwrap_or_else(|| panic!("unparseable event: {}", text.as_str()));
            }
            Message::Close(frame) => panic!("connection closed: {:?}", frame),
            _ => continue,
        }
    }
}

/// Skip roster updates until a chat arrives
async fn next_chat(ws: &mut Ws) -> ChatEventDto {
    loop {
        match next_event(ws).await {
            ServerEvent::Chat(chat) => return chat,
            ServerEvent::Users { .. } => continue,
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

/// Wait for the next roster and return its identity ids
async fn next_roster(ws: &mut Ws) -> Vec<String> {
    match next_event(ws).await {
        ServerEvent::Users { users } => users.into_iter().map(|u| u.id).collect(),
        other => panic!("expected roster, got {:?}", other),
    }
}

/// Assert that no text frame arrives within a short window
async fn assert_silent(ws: &mut Ws) {
    let deadline = tokio::time::Instant::now() + SILENCE;
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => {
                panic!("unexpected event: {}", text.as_str())
            }
            Ok(Some(Ok(_))) => continue,
            Ok(other) => panic!("connection ended: {:?}", other),
        }
    }
}

async fn send_chat(ws: &mut Ws, content: &str) {
    let json = ClientCommand::chat(content).to_json().unwrap();
    ws.send(Message::text(json)).await.unwrap();
}

#[tokio::test]
async fn test_three_sessions_chat_reaches_everyone_but_sender() {
    // テスト項目: 3 セッションが Alice, Bob, Charlie を受け取り、Bob のチャットは Alice と Charlie にだけ届く
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (mut alice, alice_user) = relay.join().await;
    let (mut bob, bob_user) = relay.join().await;
    assert_eq!(next_roster(&mut alice).await, vec!["user2"]);
    let (mut charlie, charlie_user) = relay.join().await;
    assert_eq!(next_roster(&mut alice).await, vec!["user2", "user3"]);
    assert_eq!(next_roster(&mut bob).await, vec!["user1", "user3"]);

    // when (操作):
    send_chat(&mut bob, "hi").await;

    // then (期待する結果):
    assert_eq!(
        (alice_user.id.as_str(), alice_user.name.as_str()),
        ("user1", "Alice")
    );
    assert_eq!((bob_user.id.as_str(), bob_user.name.as_str()), ("user2", "Bob"));
    assert_eq!(
        (charlie_user.id.as_str(), charlie_user.name.as_str()),
        ("user3", "Charlie")
    );

    for ws in [&mut alice, &mut charlie] {
        let chat = next_chat(ws).await;
        assert_eq!(chat.sender_id, "user2");
        assert_eq!(chat.sender_name, "Bob");
        assert_eq!(chat.content, "hi");
        assert!(hiroba_shared::time::iso8601_to_millis(&chat.timestamp).is_some());
    }
    assert_silent(&mut bob).await;
    assert_silent(&mut alice).await;
    assert_silent(&mut charlie).await;
}

#[tokio::test]
async fn test_newcomer_roster_excludes_itself() {
    // テスト項目: 新しいセッションが受け取るロスターには自分が含まれない
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (_alice, _) = relay.join().await;

    // when (操作):
    let mut bob = relay.connect().await;
    let init = next_event(&mut bob).await;
    let roster = next_roster(&mut bob).await;

    // then (期待する結果):
    let ServerEvent::Init { user } = init else {
        panic!("expected init");
    };
    assert_eq!(user.id, "user2");
    assert_eq!(roster, vec!["user1"]);
}

#[tokio::test]
async fn test_connection_beyond_pool_is_closed_without_init() {
    // テスト項目: プールサイズを超えた接続は init を受け取らずに閉じられる
    // given (前提条件):
    let relay = TestRelay::start(1).await;
    let (mut alice, _) = relay.join().await;

    // when (操作):
    let mut extra = relay.connect().await;
    let first = tokio::time::timeout(RECV_TIMEOUT, extra.next())
        .await
        .expect("timed out waiting for close");

    // then (期待する結果):
    match first {
        Some(Ok(Message::Close(Some(frame)))) => assert_eq!(u16::from(frame.code), 1013),
        Some(Ok(Message::Close(None))) | None | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected close, got {:?}", other),
    }
    // 既存のセッションには何も届かない
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_departure_updates_remaining_rosters() {
    // テスト項目: 切断後、残りのセッションに自分を除いたロスターが届く
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (mut alice, _) = relay.join().await;
    let (mut bob, _) = relay.join().await;
    next_roster(&mut alice).await;
    let (mut charlie, _) = relay.join().await;
    next_roster(&mut alice).await;
    next_roster(&mut bob).await;

    // when (操作):
    bob.close(None).await.unwrap();

    // then (期待する結果):
    assert_eq!(next_roster(&mut alice).await, vec!["user3"]);
    assert_eq!(next_roster(&mut charlie).await, vec!["user1"]);
}

#[tokio::test]
async fn test_released_identity_is_reused() {
    // テスト項目: 切断で返却された Identity は次の接続に割り当てられる
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (mut alice, _) = relay.join().await;
    let (mut bob, _) = relay.join().await;
    next_roster(&mut alice).await;

    // when (操作):
    alice.close(None).await.unwrap();
    assert!(next_roster(&mut bob).await.is_empty());
    let (_newcomer, user) = relay.join().await;

    // then (期待する結果):
    assert_eq!(user.id, "user1");
    assert_eq!(user.name, "Alice");
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_order() {
    // テスト項目: 同じ送信者のメッセージは送信順に届く
    // given (前提条件):
    let relay = TestRelay::start(2).await;
    let (mut alice, _) = relay.join().await;
    let (mut bob, _) = relay.join().await;
    next_roster(&mut alice).await;

    // when (操作):
    for i in 0..20 {
        send_chat(&mut alice, &format!("M{}", i)).await;
    }

    // then (期待する結果):
    for i in 0..20 {
        assert_eq!(next_chat(&mut bob).await.content, format!("M{}", i));
    }
}

#[tokio::test]
async fn test_broken_recipient_does_not_block_others() {
    // テスト項目: B のトランスポートが壊れても、A のメッセージは C に届く
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (mut a, _) = relay.join().await;
    let (b, _) = relay.join().await;
    next_roster(&mut a).await;
    let (mut c, _) = relay.join().await;
    next_roster(&mut a).await;

    // when (操作): B はクローズハンドシェイクなしで切断される
    drop(b);
    send_chat(&mut a, "still here").await;

    // then (期待する結果):
    let chat = next_chat(&mut c).await;
    assert_eq!(chat.sender_id, "user1");
    assert_eq!(chat.content, "still here");
}

#[tokio::test]
async fn test_malformed_payloads_are_ignored() {
    // テスト項目: 不正なペイロードは無視され、接続は維持される
    // given (前提条件):
    let relay = TestRelay::start(2).await;
    let (mut alice, _) = relay.join().await;
    let (mut bob, _) = relay.join().await;
    next_roster(&mut alice).await;

    // when (操作):
    alice.send(Message::text("not json")).await.unwrap();
    alice
        .send(Message::text(r#"{"type":"typing"}"#))
        .await
        .unwrap();
    alice
        .send(Message::text(r#"{"type":"chat","content":""}"#))
        .await
        .unwrap();
    send_chat(&mut alice, "valid").await;

    // then (期待する結果):
    let ServerEvent::Chat(chat) = next_event(&mut bob).await else {
        panic!("expected chat");
    };
    assert_eq!(chat.content, "valid");
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_client_supplied_sender_is_ignored() {
    // テスト項目: クライアントが申告した送信者情報は無視され、セッションの Identity が使われる
    // given (前提条件):
    let relay = TestRelay::start(2).await;
    let (mut alice, _) = relay.join().await;
    let (mut bob, _) = relay.join().await;
    next_roster(&mut alice).await;

    // when (操作):
    bob.send(Message::text(
        r#"{"type":"chat","content":"spoof","senderId":"user9","senderName":"Mallory"}"#,
    ))
    .await
    .unwrap();

    // then (期待する結果):
    let chat = next_chat(&mut alice).await;
    assert_eq!(chat.sender_id, "user2");
    assert_eq!(chat.sender_name, "Bob");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connects_receive_distinct_identities() {
    // テスト項目: プールサイズ以下の同時接続には互いに異なる Identity が割り当てられる
    // given (前提条件):
    let pool_size = 8;
    let relay = TestRelay::start(pool_size).await;
    let url = relay.ws_url();

    // when (操作):
    let handles: Vec<_> = (0..pool_size)
        .map(|_| {
            let url = url.clone();
            tokio::spawn(async move {
                let (mut ws, _) = connect_async(url).await.unwrap();
                let ServerEvent::Init { user } = next_event(&mut ws).await else {
                    panic!("first event must be init");
                };
                (ws, user.id)
            })
        })
        .collect();
    let mut sockets = Vec::new();
    let mut ids = HashSet::new();
    for handle in handles {
        let (ws, id) = handle.await.unwrap();
        sockets.push(ws);
        ids.insert(id);
    }

    // then (期待する結果):
    assert_eq!(ids.len(), pool_size);
}

#[tokio::test]
async fn test_root_path_accepts_upgrades() {
    // テスト項目: ルートパスでも WebSocket のアップグレードを受け付ける
    // given (前提条件):
    let relay = TestRelay::start(3).await;

    // when (操作):
    let (mut ws, _) = connect_async(format!("ws://{}/", relay.addr))
        .await
        .unwrap();

    // then (期待する結果):
    assert!(matches!(
        next_event(&mut ws).await,
        ServerEvent::Init { .. }
    ));
}

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: ヘルスチェックが {"status":"ok"} を返す
    // given (前提条件):
    let relay = TestRelay::start(3).await;

    // when (操作):
    let body: serde_json::Value = reqwest::get(relay.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_sessions_endpoint_lists_live_sessions_in_arrival_order() {
    // テスト項目: セッション一覧 API が接続中のセッションを到着順に返す
    // given (前提条件):
    let relay = TestRelay::start(3).await;
    let (mut alice, _) = relay.join().await;
    let (_bob, _) = relay.join().await;
    next_roster(&mut alice).await;

    // when (操作):
    let listing: SessionListDto = reqwest::get(relay.http_url("/api/sessions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(listing.capacity, 3);
    let ids: Vec<&str> = listing.sessions.iter().map(|s| s.user.id.as_str()).collect();
    assert_eq!(ids, vec!["user1", "user2"]);
    assert!(
        listing
            .sessions
            .iter()
            .all(|s| hiroba_shared::time::iso8601_to_millis(&s.connected_at).is_some())
    );
}
