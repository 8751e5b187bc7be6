//! Presence and messaging relay.
//!
//! Assigns each WebSocket connection an identity from a fixed pool, keeps every
//! client's roster up to date and relays chat to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3001 --pool-size 5
//! ```

use std::time::Duration;

use clap::Parser;
use hiroba_server::{
    config::{
        DEFAULT_OUTBOUND_BUFFER, DEFAULT_POOL_SIZE, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT_MS,
        RelayConfig,
    },
    ui::Server,
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "WebSocket presence and messaging relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of identities that can be connected at the same time
    #[arg(long, env = "HIROBA_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// Capacity of each connection's outbound buffer (frames)
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    outbound_buffer: usize,

    /// Timeout of a single socket write (milliseconds)
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    write_timeout_ms: u64,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        RelayConfig::new(args.host, args.port)
            .with_pool_size(args.pool_size)
            .with_outbound_buffer(args.outbound_buffer)
            .with_write_timeout(Duration::from_millis(args.write_timeout_ms))
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = RelayConfig::from(Args::parse());
    tracing::info!(
        "Starting relay (pool size {}, outbound buffer {})",
        config.pool_size,
        config.outbound_buffer()
    );

    let server = Server::from_config(&config);
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
