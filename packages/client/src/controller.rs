//! Reconnecting relay client.
//!
//! A single controller task owns the connection, the reconnect timer, the
//! offline queue and the inbox. [`RelayClient`] is a cheap handle that talks to
//! it over a channel, and [`ClientEvent`]s report everything the task observes.
//!
//! ```text
//! Disconnected --timer--> Connecting --init--> Connected
//!      ^                      |                    |
//!      +------ failure -------+------- close ------+
//! ```
//!
//! Reconnects happen after a fixed delay, forever, with at most one attempt in
//! flight.

use std::time::Duration;

use futures_util::StreamExt;
use hiroba_server::{domain::MessageContent, infrastructure::dto::websocket::ServerEvent};
use hiroba_shared::time::{millis_to_iso8601, now_millis};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{JoinError, JoinHandle},
    time::Instant,
};
use tokio_tungstenite::tungstenite::{self, protocol::Message};

use crate::{
    config::ClientConfig,
    domain::{ChatEntry, ConnectionState, Contact, Inbox, OfflineQueue, OutgoingChat},
    error::ClientError,
    transport::{self, Incoming, RelayStream},
};

/// Everything the controller reports to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    StateChanged(ConnectionState),
    /// `init` received: our identity for this connection
    Identified(Contact),
    /// Contacts after a roster update (self excluded)
    RosterUpdated(Vec<Contact>),
    MessageReceived {
        contact_id: String,
        message: ChatEntry,
    },
    /// Local echo of a chat written to the relay
    MessageSent {
        contact_id: String,
        message: ChatEntry,
    },
    /// Offline queue length after it changed
    Queued(usize),
}

enum Command {
    Send(OutgoingChat),
    SetActive(Option<String>),
    MarkAsRead(String),
    Inbox(oneshot::Sender<Inbox>),
    Shutdown,
}

/// Handle to the controller task
pub struct RelayClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl RelayClient {
    /// Spawn the controller and start connecting immediately
    pub fn spawn(config: ClientConfig) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let controller = Controller {
            config,
            commands: command_rx,
            events: event_tx,
            state_tx,
            state: ConnectionState::Disconnected,
            queue: OfflineQueue::new(),
            inbox: Inbox::new(),
            attempt: None,
            link: None,
            retry_at: None,
            handshake_deadline: None,
        };
        let task = tokio::spawn(controller.run());

        (
            Self {
                commands: command_tx,
                state: state_rx,
                task,
            },
            event_rx,
        )
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Send a chat, or queue it until the connection is back
    ///
    /// The local echo is filed under `contact_id`'s conversation. Content the
    /// relay would refuse (empty or too long) is rejected here, so it is never
    /// queued or echoed.
    pub fn send(
        &self,
        contact_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ClientError> {
        let content = MessageContent::new(content.into())?;
        self.command(Command::Send(OutgoingChat::new(
            contact_id,
            content.into_string(),
        )))
    }

    pub fn set_active_conversation(&self, contact_id: Option<String>) -> Result<(), ClientError> {
        self.command(Command::SetActive(contact_id))
    }

    pub fn mark_as_read(&self, contact_id: impl Into<String>) -> Result<(), ClientError> {
        self.command(Command::MarkAsRead(contact_id.into()))
    }

    /// Snapshot of contacts and conversations
    pub async fn inbox(&self) -> Result<Inbox, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Inbox(tx))?;
        rx.await.map_err(|_| ClientError::ShutDown)
    }

    /// Close the connection, cancel any pending reconnect and wait for the task
    pub async fn shutdown(self) -> Result<(), ClientError> {
        // 既に停止している場合は送信に失敗するが、そのまま待機する
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::ShutDown)
    }
}

enum Wake {
    Command(Option<Command>),
    Attempt(Result<Result<RelayStream, ClientError>, JoinError>),
    Frame(Option<Result<Message, tungstenite::Error>>),
    Retry,
    HandshakeExpired,
}

struct Controller {
    config: ClientConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
    state_tx: watch::Sender<ConnectionState>,
    state: ConnectionState,
    queue: OfflineQueue,
    inbox: Inbox,
    /// 進行中の接続試行（常に高々 1 つ）
    attempt: Option<JoinHandle<Result<RelayStream, ClientError>>>,
    link: Option<RelayStream>,
    retry_at: Option<Instant>,
    handshake_deadline: Option<Instant>,
}

impl Controller {
    async fn run(mut self) {
        self.begin_attempt();

        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                result = wait_attempt(&mut self.attempt) => Wake::Attempt(result),
                frame = next_frame(&mut self.link) => Wake::Frame(frame),
                _ = sleep_until(self.retry_at) => Wake::Retry,
                _ = sleep_until(self.handshake_deadline) => Wake::HandshakeExpired,
            };

            match wake {
                Wake::Command(None | Some(Command::Shutdown)) => {
                    self.close().await;
                    break;
                }
                Wake::Command(Some(command)) => self.on_command(command).await,
                Wake::Attempt(result) => self.on_attempt(result),
                Wake::Frame(frame) => self.on_frame(frame).await,
                Wake::Retry => {
                    self.retry_at = None;
                    self.begin_attempt();
                }
                Wake::HandshakeExpired => {
                    let timeout = ClientError::HandshakeTimeout(
                        self.config.handshake_timeout.as_millis(),
                    );
                    tracing::warn!("{}", timeout);
                    self.link_lost();
                }
            }
        }

        tracing::info!("Client stopped");
    }

    fn begin_attempt(&mut self) {
        if self.attempt.is_some() || self.link.is_some() {
            return;
        }

        self.set_state(ConnectionState::Connecting);
        tracing::info!("Connecting to {}", self.config.url);

        let url = self.config.url.clone();
        let timeout = self.config.handshake_timeout;
        self.attempt = Some(tokio::spawn(
            async move { transport::open(&url, timeout).await },
        ));
    }

    fn on_attempt(&mut self, result: Result<Result<RelayStream, ClientError>, JoinError>) {
        self.attempt = None;

        match result {
            Ok(Ok(stream)) => {
                tracing::info!("Transport open, waiting for init");
                self.link = Some(stream);
                self.handshake_deadline = Some(Instant::now() + self.config.handshake_timeout);
            }
            Ok(Err(e)) => {
                tracing::warn!("{}", e);
                self.schedule_retry();
            }
            Err(e) => {
                tracing::warn!("Connection attempt aborted: {}", e);
                self.schedule_retry();
            }
        }
    }

    async fn on_frame(&mut self, frame: Option<Result<Message, tungstenite::Error>>) {
        match frame {
            Some(Ok(message)) => match transport::decode(message) {
                Incoming::Event(event) => self.on_event(event).await,
                Incoming::Ignored => {}
                Incoming::Closed => self.link_lost(),
            },
            Some(Err(e)) => {
                tracing::warn!("WebSocket read error: {}", e);
                self.link_lost();
            }
            None => self.link_lost(),
        }
    }

    async fn on_event(&mut self, event: ServerEvent) {
        let now = now_iso8601();

        match event {
            ServerEvent::Init { user } => {
                let me = self.inbox.identify(user, &now);
                tracing::info!("Identified as '{}' ({})", me.id, me.name);
                self.handshake_deadline = None;
                self.emit(ClientEvent::Identified(me));
                self.set_state(ConnectionState::Connected);
                self.flush().await;
            }
            ServerEvent::Users { users } => {
                let contacts = self.inbox.replace_roster(users, &now).to_vec();
                tracing::debug!("Roster updated: {} contact(s)", contacts.len());
                self.emit(ClientEvent::RosterUpdated(contacts));
            }
            ServerEvent::Chat(chat) => {
                let message = self.inbox.receive_chat(chat, &now);
                self.emit(ClientEvent::MessageReceived {
                    contact_id: message.sender_id.clone(),
                    message,
                });
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Send(chat) => {
                if !self.state.is_connected() {
                    let len = self.queue.enqueue(chat);
                    tracing::debug!("Offline, queued chat ({} pending)", len);
                    self.emit(ClientEvent::Queued(len));
                    return;
                }
                if let Err(chat) = self.transmit(chat).await {
                    let len = self.queue.enqueue(chat);
                    self.emit(ClientEvent::Queued(len));
                    self.link_lost();
                }
            }
            Command::SetActive(contact_id) => self.inbox.set_active(contact_id),
            Command::MarkAsRead(contact_id) => {
                self.inbox.mark_as_read(&contact_id);
            }
            Command::Inbox(reply) => {
                let _ = reply.send(self.inbox.clone());
            }
            // run() で処理済み
            Command::Shutdown => {}
        }
    }

    /// Write a chat to the relay and record its local echo
    ///
    /// Returns the chat back when it could not be written.
    async fn transmit(&mut self, chat: OutgoingChat) -> Result<(), OutgoingChat> {
        let Some(link) = self.link.as_mut() else {
            return Err(chat);
        };

        if let Err(e) = transport::send_chat(link, &chat.content).await {
            tracing::warn!("Failed to send chat: {}", e);
            return Err(chat);
        }

        let message = self
            .inbox
            .record_sent(&chat.contact_id, &chat.content, &now_iso8601());
        self.emit(ClientEvent::MessageSent {
            contact_id: chat.contact_id,
            message,
        });
        Ok(())
    }

    /// Send everything queued while offline, in submission order
    async fn flush(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        tracing::info!("Flushing {} queued chat(s)", self.queue.len());

        while let Some(chat) = self.queue.pop_front() {
            if let Err(chat) = self.transmit(chat).await {
                self.queue.requeue_front(chat);
                self.emit(ClientEvent::Queued(self.queue.len()));
                self.link_lost();
                return;
            }
        }
        self.emit(ClientEvent::Queued(0));
    }

    fn link_lost(&mut self) {
        self.link = None;
        self.handshake_deadline = None;
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        self.set_state(ConnectionState::Disconnected);
        self.retry_at = Some(Instant::now() + self.config.reconnect_delay);
        tracing::info!(
            "Reconnecting in {} ms",
            self.config.reconnect_delay.as_millis()
        );
    }

    async fn close(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            attempt.abort();
        }
        self.retry_at = None;
        self.handshake_deadline = None;

        if let Some(mut link) = self.link.take() {
            let _ = tokio::time::timeout(Duration::from_secs(1), link.close(None)).await;
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        tracing::info!("Connection state: {} -> {}", self.state, state);
        self.state = state;
        self.state_tx.send_replace(state);
        self.emit(ClientEvent::StateChanged(state));
    }

    fn emit(&self, event: ClientEvent) {
        // 受信側が破棄されていても制御は続ける
        let _ = self.events.send(event);
    }
}

async fn wait_attempt(
    attempt: &mut Option<JoinHandle<Result<RelayStream, ClientError>>>,
) -> Result<Result<RelayStream, ClientError>, JoinError> {
    match attempt {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(link: &mut Option<RelayStream>) -> Option<Result<Message, tungstenite::Error>> {
    match link {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_iso8601() -> String {
    millis_to_iso8601(now_millis())
}
