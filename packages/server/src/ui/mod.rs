//! WebSocket relay server.

mod handler;
mod server;
mod signal;
pub mod state; // UseCase の組み立てに使うため public

pub use server::Server;
pub use signal::shutdown_signal;
