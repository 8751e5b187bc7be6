//! Reconnecting client for the Hiroba presence and messaging relay.
//!
//! - `controller`: connection lifecycle, reconnect timer and offline queue
//! - `domain`: connection state, queued chats and the inbox
//! - `transport`: WebSocket framing against the relay
//! - `cli` / `formatter` / `ui`: interactive terminal front end

pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod transport;
pub mod ui;

pub use config::ClientConfig;
pub use controller::{ClientEvent, RelayClient};
pub use error::ClientError;
