//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::UserDto;

/// Live session as reported by `GET /api/sessions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub connection_id: String,
    pub user: UserDto,
    /// ISO-8601
    pub connected_at: String,
}

/// Response of `GET /api/sessions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListDto {
    pub sessions: Vec<SessionDto>,
    pub capacity: usize,
}
