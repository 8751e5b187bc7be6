//! Interactive client for the presence and messaging relay.
//!
//! Connects to the relay, shows who is online and lets you chat. Chats typed
//! while the connection is down are queued and sent once it comes back. The
//! client reconnects forever with a fixed delay.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client
//! cargo run --bin hiroba-client -- --url ws://127.0.0.1:3001/ws --reconnect-delay-secs 2
//! ```

use std::time::Duration;

use clap::Parser;
use hiroba_client::{
    cli::run_client,
    config::{
        ClientConfig, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_RECONNECT_DELAY_SECS, DEFAULT_URL,
    },
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Reconnecting client for the presence and messaging relay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, env = "HIROBA_WS_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Delay between reconnect attempts (seconds)
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY_SECS)]
    reconnect_delay_secs: u64,

    /// Time allowed for the connection and the init message (seconds)
    #[arg(long, default_value_t = DEFAULT_HANDSHAKE_TIMEOUT_SECS)]
    handshake_timeout_secs: u64,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        ClientConfig::new(args.url)
            .with_reconnect_delay(Duration::from_secs(args.reconnect_delay_secs))
            .with_handshake_timeout(Duration::from_secs(args.handshake_timeout_secs))
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ClientConfig::from(Args::parse());

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
