//! Error types for the relay client.

use hiroba_server::domain::ValueObjectError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The relay did not send `init` in time
    #[error("Handshake timed out after {0} ms")]
    HandshakeTimeout(u128),

    /// Chat content the relay would not accept
    #[error("Invalid chat: {0}")]
    InvalidContent(#[from] ValueObjectError),

    /// The controller task has stopped
    #[error("Client has shut down")]
    ShutDown,

    #[error("Failed to serialize command: {0}")]
    Serialization(#[from] serde_json::Error),
}
