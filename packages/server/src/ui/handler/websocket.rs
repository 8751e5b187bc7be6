//! WebSocket connection handlers.
//!
//! Each upgraded socket is driven by a [`SessionMachine`]: incoming frames are
//! turned into [`SessionInput`]s and the returned [`SessionAction`] decides
//! what the relay does with them.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, MessageContent, SessionAction, SessionInput,
        SessionMachine,
    },
    infrastructure::dto::websocket::ClientCommand,
    ui::state::AppState,
    usecase::ConnectError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Turn a text frame into a state machine input.
pub(crate) fn classify_frame(text: &str) -> SessionInput {
    match ClientCommand::parse(text) {
        Ok(ClientCommand::Chat { content }) => match MessageContent::new(content) {
            Ok(content) => SessionInput::ChatReceived(content),
            Err(e) => SessionInput::MalformedReceived(e.to_string()),
        },
        Err(e) => SessionInput::MalformedReceived(format!("unrecognized payload: {}", e)),
    }
}

/// Spawns a task that drains the outbound channel into the WebSocket sink.
///
/// The task ends when the channel is closed (the connection was unregistered
/// or dropped for a full buffer), when a write fails, or when a write does
/// not finish within `write_timeout`.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    write_timeout: Duration,
    connection_id: ConnectionId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match tokio::time::timeout(write_timeout, sender.send(Message::Text(msg.into()))).await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("Failed to write to '{}': {}", connection_id, e);
                    return;
                }
                Err(_) => {
                    tracing::warn!("Write to '{}' timed out", connection_id);
                    return;
                }
            }
        }

        // 送信キューが閉じられた: 接続を閉じる
        let _ = tokio::time::timeout(write_timeout, sender.send(Message::Close(None))).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let mut machine = SessionMachine::new();
    let (mut sender, mut receiver) = socket.split();

    // Create a bounded channel for this connection's outbound events
    let (tx, rx) = mpsc::channel(state.outbound_buffer);

    let session = match state
        .connect_session_usecase
        .execute(connection_id.clone(), tx)
        .await
    {
        Ok(session) => {
            machine.handle(SessionInput::Admitted);
            session
        }
        Err(e) => {
            tracing::warn!("Refusing connection '{}': {}", connection_id, e);
            if machine.handle(SessionInput::Refused) == SessionAction::Close {
                let reason = match e {
                    ConnectError::PoolExhausted => "identity pool exhausted",
                    _ => "connection refused",
                };
                let close_frame = CloseFrame {
                    code: close_code::AGAIN,
                    reason: reason.into(),
                };
                let _ = sender.send(Message::Close(Some(close_frame))).await;
            }
            return;
        }
    };
    tracing::info!(
        "Connection '{}' joined as '{}' ({})",
        connection_id,
        session.identity.id,
        session.identity.name
    );

    let mut send_task = pusher_loop(rx, sender, state.write_timeout, connection_id.clone());

    loop {
        let input = tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                    classify_frame(text.as_str())
                }
                Some(Ok(Message::Binary(_))) => {
                    SessionInput::MalformedReceived("binary frames are not supported".to_string())
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Connection '{}' closed by client", connection_id);
                    SessionInput::TransportClosed
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    SessionInput::TransportClosed
                }
            },
            _ = &mut send_task => {
                tracing::info!("Outbound stream of '{}' ended", connection_id);
                SessionInput::TransportClosed
            }
        };

        match machine.handle(input) {
            SessionAction::BroadcastChat(content) => {
                if let Err(e) = state
                    .send_chat_usecase
                    .execute(&connection_id, content)
                    .await
                {
                    tracing::warn!("Failed to relay chat from '{}': {}", connection_id, e);
                }
            }
            SessionAction::Ignore(reason) => {
                tracing::warn!("Ignoring payload from '{}': {}", connection_id, reason);
            }
            SessionAction::Teardown | SessionAction::Close => break,
            SessionAction::None => {}
        }
    }

    send_task.abort();

    match state
        .disconnect_session_usecase
        .execute(&connection_id)
        .await
    {
        Ok(Some(session)) => tracing::info!(
            "Connection '{}' left, released '{}'",
            connection_id,
            session.identity.id
        ),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to announce departure of '{}': {}", connection_id, e),
    }
}
