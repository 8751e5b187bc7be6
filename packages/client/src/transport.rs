//! WebSocket transport to the relay.

use std::time::Duration;

use futures_util::SinkExt;
use hiroba_server::infrastructure::dto::websocket::{ClientCommand, ServerEvent};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::error::ClientError;

pub type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What a received frame means to the client
#[derive(Debug, PartialEq, Eq)]
pub enum Incoming {
    Event(ServerEvent),
    /// Control frames, binary frames and unrecognized payloads
    Ignored,
    Closed,
}

/// Open a connection, giving up after `timeout`
pub async fn open(url: &str, timeout: Duration) -> Result<RelayStream, ClientError> {
    match tokio::time::timeout(timeout, connect_async(url)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(ClientError::ConnectionError(e.to_string())),
        Err(_) => Err(ClientError::ConnectionError(format!(
            "connecting to {} timed out",
            url
        ))),
    }
}

/// Classify a received frame
pub fn decode(message: Message) -> Incoming {
    match message {
        Message::Text(text) => match ServerEvent::parse(text.as_str()) {
            Some(event) => Incoming::Event(event),
            None => {
                tracing::warn!("Ignoring unrecognized payload: {}", text.as_str());
                Incoming::Ignored
            }
        },
        Message::Close(frame) => {
            tracing::info!("Relay closed the connection: {:?}", frame);
            Incoming::Closed
        }
        _ => Incoming::Ignored,
    }
}

/// Send a chat command
pub async fn send_chat(stream: &mut RelayStream, content: &str) -> Result<(), ClientError> {
    let json = ClientCommand::chat(content).to_json()?;
    stream
        .send(Message::text(json))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}
