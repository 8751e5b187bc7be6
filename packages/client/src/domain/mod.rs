//! Client-side domain model.
//!
//! - `connection_state`: Disconnected / Connecting / Connected
//! - `offline_queue`: chat submitted while disconnected
//! - `inbox`: contacts, conversations and unread accounting

pub mod connection_state;
pub mod inbox;
pub mod offline_queue;

pub use connection_state::ConnectionState;
pub use inbox::{ChatEntry, Contact, Conversation, DeliveryStatus, Inbox, Presence};
pub use offline_queue::{OfflineQueue, OutgoingChat};
