//! Conversion logic between DTOs and domain entities.

use crate::domain::{ChatMessage, Identity, Session};
use crate::infrastructure::dto::{
    http::SessionDto,
    websocket::{ChatEventDto, ServerEvent, UserDto},
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Identity> for UserDto {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.as_str().to_string(),
            name: identity.name.as_str().to_string(),
        }
    }
}

impl From<&ChatMessage> for ChatEventDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender_id: message.sender.id.as_str().to_string(),
            sender_name: message.sender.name.as_str().to_string(),
            content: message.content.as_str().to_string(),
            timestamp: message.timestamp.to_iso8601(),
        }
    }
}

impl From<&Session> for SessionDto {
    fn from(session: &Session) -> Self {
        Self {
            connection_id: session.connection_id.to_string(),
            user: UserDto::from(&session.identity),
            connected_at: session.connected_at.to_iso8601(),
        }
    }
}

impl ServerEvent {
    pub fn init(identity: &Identity) -> Self {
        Self::Init {
            user: identity.into(),
        }
    }

    pub fn roster(identities: &[Identity]) -> Self {
        Self::Users {
            users: identities.iter().map(UserDto::from).collect(),
        }
    }

    pub fn chat(message: &ChatMessage) -> Self {
        Self::Chat(message.into())
    }
}
