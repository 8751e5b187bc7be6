//! Interactive command line front end.
//!
//! Lines typed by the user become [`InputCommand`]s. Plain text is sent to the
//! active conversation; lines starting with `/` are commands.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    controller::{ClientEvent, RelayClient},
    domain::ConnectionState,
    error::ClientError,
    formatter::MessageFormatter,
    ui::{PROMPT, redisplay_prompt},
};

const HELP: &str = "\
Commands:
  /open <id>   open the conversation with a contact
  /close       leave the active conversation
  /contacts    list contacts and unread counts
  /status      show the connection status
  /quit        exit
Any other line is sent to the active conversation.
";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Open(String),
    Close,
    Contacts,
    Status,
    Help,
    Quit,
    Chat(String),
    Invalid(String),
}

/// Parse one line of user input
pub fn parse_input(line: &str) -> InputCommand {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return InputCommand::Chat(line.to_string());
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();

    match (name, argument) {
        ("open", "") => InputCommand::Invalid("usage: /open <id>".to_string()),
        ("open", id) => InputCommand::Open(id.to_string()),
        ("close", _) => InputCommand::Close,
        ("contacts", _) => InputCommand::Contacts,
        ("status", _) => InputCommand::Status,
        ("help", _) => InputCommand::Help,
        ("quit" | "exit", _) => InputCommand::Quit,
        (other, _) => InputCommand::Invalid(format!("unknown command: /{}", other)),
    }
}

/// Run the interactive client until the user quits
pub async fn run_client(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (client, mut events) = RelayClient::spawn(config);

    println!("\nType /help for commands. Press Ctrl+C to exit.\n");

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline は同期 API のため専用スレッドで読む
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut active: Option<String> = None;
    let mut queued = 0;

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                match parse_input(&line) {
                    InputCommand::Quit => break,
                    InputCommand::Help => print!("{}", HELP),
                    InputCommand::Status => {
                        println!("{}", MessageFormatter::format_status(client.state(), queued));
                    }
                    InputCommand::Contacts => {
                        let inbox = client.inbox().await?;
                        print!("{}", MessageFormatter::format_inbox(&inbox));
                    }
                    InputCommand::Open(id) => {
                        client.set_active_conversation(Some(id.clone()))?;
                        let inbox = client.inbox().await?;
                        match inbox.conversation(&id) {
                            Some(conversation) => {
                                print!("{}", MessageFormatter::format_conversation(conversation));
                            }
                            None => println!("Opened conversation with {}", id),
                        }
                        active = Some(id);
                    }
                    InputCommand::Close => {
                        client.set_active_conversation(None)?;
                        active = None;
                    }
                    InputCommand::Chat(content) => match &active {
                        Some(contact_id) => match client.send(contact_id.clone(), content) {
                            Err(ClientError::InvalidContent(e)) => println!("Not sent: {}", e),
                            result => result?,
                        },
                        None => println!("No active conversation. Use /open <id> first."),
                    },
                    InputCommand::Invalid(reason) => println!("{}", reason),
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if let ClientEvent::Queued(len) = &event {
                    queued = *len;
                }
                if let Some(output) = render_event(&event, active.as_deref(), queued) {
                    print!("{}", output);
                    redisplay_prompt();
                }
            }
        }
    }

    client.shutdown().await?;
    Ok(())
}

/// Text printed for a controller event, if any
///
/// `queued` is the offline queue length last reported by the controller.
fn render_event(event: &ClientEvent, active: Option<&str>, queued: usize) -> Option<String> {
    match event {
        ClientEvent::StateChanged(ConnectionState::Connecting) => None,
        ClientEvent::StateChanged(state) => Some(format!(
            "\n{}\n",
            MessageFormatter::format_status(*state, queued)
        )),
        ClientEvent::Identified(me) => Some(MessageFormatter::format_identified(me)),
        ClientEvent::RosterUpdated(contacts) => Some(MessageFormatter::format_contacts(contacts)),
        ClientEvent::MessageReceived {
            contact_id,
            message,
        } => {
            if active == Some(contact_id.as_str()) {
                Some(MessageFormatter::format_chat_message(message))
            } else {
                Some(format!(
                    "\n(new message from {} - /open {} to read)\n",
                    message.sender_name, contact_id
                ))
            }
        }
        ClientEvent::MessageSent { message, .. } => Some(format!(
            "\n{}",
            MessageFormatter::format_sent_confirmation(message)
        )),
        ClientEvent::Queued(0) => None,
        ClientEvent::Queued(len) => Some(format!("\nqueued ({} pending)\n", len)),
    }
}
