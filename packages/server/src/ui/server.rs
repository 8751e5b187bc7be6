//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use hiroba_shared::time::SystemClock;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;

use crate::{
    config::RelayConfig,
    domain::{ConnectionRegistry, IdentityPool},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryConnectionRepository,
    },
    usecase::{
        BroadcastEngine, ConnectSessionUseCase, DisconnectSessionUseCase, ListSessionsUseCase,
        SendChatUseCase,
    },
};

use super::{
    handler::{health_check, list_sessions, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket presence and messaging relay
///
/// # Example
///
/// ```ignore
/// let config = RelayConfig::new("127.0.0.1", 3001);
/// let server = Server::from_config(&config);
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server from already wired use cases
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Wire the registry, pusher and use cases described by `config`
    ///
    /// Initialize dependencies in order:
    /// 1. Repository (connection registry + identity pool)
    /// 2. MessagePusher
    /// 3. BroadcastEngine
    /// 4. UseCases
    pub fn from_config(config: &RelayConfig) -> Self {
        // 1. Repository
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new(IdentityPool::with_size(
            config.pool_size,
        ))));
        let repository = Arc::new(InMemoryConnectionRepository::new(registry));

        // 2. MessagePusher
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. BroadcastEngine
        let broadcast_engine = Arc::new(BroadcastEngine::new(
            repository.clone(),
            message_pusher.clone(),
        ));

        // 4. UseCases
        let clock = Arc::new(SystemClock);
        let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            broadcast_engine.clone(),
            clock.clone(),
        ));
        let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
            repository.clone(),
            message_pusher,
            broadcast_engine.clone(),
        ));
        let send_chat_usecase = Arc::new(SendChatUseCase::new(
            repository.clone(),
            broadcast_engine,
            clock,
        ));
        let list_sessions_usecase = Arc::new(ListSessionsUseCase::new(repository));

        Self::new(AppState {
            connect_session_usecase,
            disconnect_session_usecase,
            send_chat_usecase,
            list_sessions_usecase,
            outbound_buffer: config.outbound_buffer(),
            write_timeout: config.write_timeout,
        })
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/", get(websocket_handler))
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/sessions", get(list_sessions))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run the relay
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 3001)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
