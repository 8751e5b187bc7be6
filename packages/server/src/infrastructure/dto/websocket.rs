//! WebSocket wire format.
//!
//! Every frame is a UTF-8 JSON object discriminated by its `type` field.
//!
//! Server → client:
//! - `{"type":"init","user":{"id":..,"name":..}}`
//! - `{"type":"users","users":[{"id":..,"name":..}, ...]}`
//! - `{"type":"chat","senderId":..,"senderName":..,"content":..,"timestamp":..}`
//!
//! Client → server:
//! - `{"type":"chat","content":..}` (any sender fields are ignored)

use serde::{Deserialize, Serialize};

/// Identity as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
}

/// Chat event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEventDto {
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// ISO-8601 timestamp assigned by the server
    pub timestamp: String,
}

/// Events sent from the relay to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent once, only to the new session, right after the handshake
    #[serde(rename = "init")]
    Init { user: UserDto },

    /// Full roster (never a diff), excluding the recipient
    #[serde(rename = "users")]
    Users { users: Vec<UserDto> },

    #[serde(rename = "chat")]
    Chat(ChatEventDto),
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a frame; unknown `type`s and invalid JSON yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Commands sent from clients to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "chat")]
    Chat { content: String },
}

impl ClientCommand {
    pub fn chat(content: impl Into<String>) -> Self {
        Self::Chat {
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
