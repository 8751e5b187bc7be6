//! Presence and messaging relay.
//!
//! Clients connect over WebSocket, receive an identity from a fixed pool, see
//! the roster of connected peers and exchange broadcast chat messages.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
